use crate::asset_loader::panic_message;
use crate::{Asset, DisposeError, DynAsset, LoadError, LoadResult};
use lading_base::hashing::HashMap;
use lading_base::AssetTypeId;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

struct CacheEntry {
    asset: Arc<dyn DynAsset>,
    asset_type: AssetTypeId,
    ref_count: u32,
}

/// Owns every loaded asset. An entry exists only while its reference count is above zero; the
/// release that drops it to zero disposes the asset before returning.
///
/// Handles are cheap to clone and share one lock, so the cache can be read from any thread.
#[derive(Clone, Default)]
pub struct AssetCache {
    inner: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl AssetCache {
    /// Typed lookup. Fails with `NotFound` if the name isn't loaded as `T`.
    pub fn get<T: Asset>(
        &self,
        name: &str,
    ) -> LoadResult<Arc<T>> {
        let asset = self.get_by_type(name, AssetTypeId::of::<T>())?;
        asset.downcast_arc::<T>().map_err(|_| LoadError::NotFound {
            name: name.to_string(),
        })
    }

    pub fn get_by_type(
        &self,
        name: &str,
        asset_type: AssetTypeId,
    ) -> LoadResult<Arc<dyn DynAsset>> {
        let inner = self.inner.lock();
        match inner.get(name) {
            Some(entry) if entry.asset_type == asset_type => Ok(entry.asset.clone()),
            _ => Err(LoadError::NotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Installs a finished asset holding `ref_count` references
    pub fn insert(
        &self,
        name: &str,
        asset: Arc<dyn DynAsset>,
        ref_count: u32,
    ) -> LoadResult<()> {
        let asset_type = asset.asset_type();
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.get(name) {
            return Err(if existing.asset_type != asset_type {
                LoadError::TypeConflict {
                    name: name.to_string(),
                    existing: existing.asset_type,
                    requested: asset_type,
                }
            } else {
                LoadError::AlreadyLoaded {
                    name: name.to_string(),
                }
            });
        }

        log::trace!("cache insert {} {:?} refs: {}", name, asset_type, ref_count);
        inner.insert(
            name.to_string(),
            CacheEntry {
                asset,
                asset_type,
                ref_count,
            },
        );
        Ok(())
    }

    /// Returns the new reference count. Fails with `RefCountOverflow`, leaving the count unchanged,
    /// if it is already `u32::MAX`.
    pub fn add_ref(
        &self,
        name: &str,
    ) -> LoadResult<u32> {
        let mut inner = self.inner.lock();
        let entry = inner.get_mut(name).ok_or_else(|| LoadError::NotFound {
            name: name.to_string(),
        })?;
        entry.ref_count = entry
            .ref_count
            .checked_add(1)
            .ok_or_else(|| LoadError::RefCountOverflow {
                name: name.to_string(),
            })?;
        log::trace!("add_ref {} -> {}", name, entry.ref_count);
        Ok(entry.ref_count)
    }

    /// Returns the new reference count. Reaching zero removes and disposes the asset. A disposal
    /// that fails or panics is logged, the entry is removed regardless.
    pub fn release(
        &self,
        name: &str,
    ) -> LoadResult<u32> {
        let removed = {
            let mut inner = self.inner.lock();
            let entry = inner.get_mut(name).ok_or_else(|| LoadError::NotFound {
                name: name.to_string(),
            })?;
            entry.ref_count = entry.ref_count.saturating_sub(1);
            log::trace!("release {} -> {}", name, entry.ref_count);
            if entry.ref_count > 0 {
                return Ok(entry.ref_count);
            }

            inner.remove(name)
        };

        // Dispose outside the lock so asset teardown can read the cache
        if let Some(entry) = removed {
            log::info!("Dispose {} {:?}", name, entry.asset_type);
            if let Err(error) = Self::dispose(name, entry.asset) {
                log::error!("{}", error);
            }
        }

        Ok(0)
    }

    fn dispose(
        name: &str,
        mut asset: Arc<dyn DynAsset>,
    ) -> Result<(), DisposeError> {
        profiling::scope!("AssetCache::dispose");
        match Arc::get_mut(&mut asset) {
            Some(asset) => match std::panic::catch_unwind(AssertUnwindSafe(|| asset.dispose())) {
                Ok(result) => result.map_err(|source| DisposeError::Failed {
                    name: name.to_string(),
                    source,
                }),
                Err(panic) => Err(DisposeError::Panicked {
                    name: name.to_string(),
                    message: panic_message(&*panic),
                }),
            },
            None => Err(DisposeError::StillShared {
                name: name.to_string(),
                strong_count: Arc::strong_count(&asset),
            }),
        }
    }

    pub fn is_loaded(
        &self,
        name: &str,
    ) -> bool {
        self.inner.lock().contains_key(name)
    }

    pub fn is_loaded_with_type(
        &self,
        name: &str,
        asset_type: AssetTypeId,
    ) -> bool {
        self.inner
            .lock()
            .get(name)
            .map_or(false, |x| x.asset_type == asset_type)
    }

    pub fn ref_count(
        &self,
        name: &str,
    ) -> Option<u32> {
        self.inner.lock().get(name).map(|x| x.ref_count)
    }

    pub fn asset_type(
        &self,
        name: &str,
    ) -> Option<AssetTypeId> {
        self.inner.lock().get(name).map(|x| x.asset_type)
    }

    /// Sorted, so output built from it is stable
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.inner.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::LoaderResult;
    use lading_base::TypeUuid;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(TypeUuid)]
    #[uuid = "1f2e3d4c-5b6a-4978-8695-a4b3c2d1e041"]
    struct Sound {
        disposed: Arc<AtomicUsize>,
        fail_dispose: bool,
    }

    impl Asset for Sound {
        fn dispose(&mut self) -> LoaderResult<()> {
            self.disposed.fetch_add(1, Ordering::SeqCst);
            if self.fail_dispose {
                Err("device lost".into())
            } else {
                Ok(())
            }
        }
    }

    #[derive(TypeUuid)]
    #[uuid = "7a6b5c4d-3e2f-4a1b-9c8d-7e6f5a4b3c51"]
    struct Music;

    impl Asset for Music {}

    fn sound(
        disposed: &Arc<AtomicUsize>,
        fail_dispose: bool,
    ) -> Arc<dyn DynAsset> {
        Arc::new(Sound {
            disposed: disposed.clone(),
            fail_dispose,
        })
    }

    #[test]
    fn release_to_zero_disposes_and_removes() {
        let cache = AssetCache::default();
        let disposed = Arc::new(AtomicUsize::new(0));
        cache.insert("boom.wav", sound(&disposed, false), 1).unwrap();
        assert_eq!(cache.add_ref("boom.wav").unwrap(), 2);
        assert!(cache.is_loaded_with_type("boom.wav", AssetTypeId::of::<Sound>()));
        assert!(!cache.is_loaded_with_type("boom.wav", AssetTypeId::of::<Music>()));

        assert_eq!(cache.release("boom.wav").unwrap(), 1);
        assert_eq!(disposed.load(Ordering::SeqCst), 0);
        assert_eq!(cache.release("boom.wav").unwrap(), 0);
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
        assert!(!cache.is_loaded("boom.wav"));
        assert!(matches!(
            cache.release("boom.wav"),
            Err(LoadError::NotFound { .. })
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_dispose_still_removes_entry() {
        let cache = AssetCache::default();
        let disposed = Arc::new(AtomicUsize::new(0));
        cache.insert("broken.wav", sound(&disposed, true), 1).unwrap();
        assert_eq!(cache.release("broken.wav").unwrap(), 0);
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
        assert!(!cache.is_loaded("broken.wav"));
    }

    #[test]
    fn outstanding_instances_skip_dispose_but_remove_entry() {
        let cache = AssetCache::default();
        let disposed = Arc::new(AtomicUsize::new(0));
        cache.insert("held.wav", sound(&disposed, false), 1).unwrap();
        let held = cache.get::<Sound>("held.wav").unwrap();
        assert_eq!(cache.release("held.wav").unwrap(), 0);
        assert!(!cache.is_loaded("held.wav"));
        assert_eq!(disposed.load(Ordering::SeqCst), 0);
        drop(held);
    }

    #[test]
    fn typed_get_and_insert_conflicts() {
        let cache = AssetCache::default();
        cache.insert("theme", Arc::new(Music), 1).unwrap();
        assert!(cache.get::<Music>("theme").is_ok());
        assert!(matches!(
            cache.get::<Sound>("theme"),
            Err(LoadError::NotFound { .. })
        ));
        assert!(matches!(
            cache.insert("theme", Arc::new(Music), 1),
            Err(LoadError::AlreadyLoaded { .. })
        ));
        let disposed = Arc::new(AtomicUsize::new(0));
        assert!(matches!(
            cache.insert("theme", sound(&disposed, false), 1),
            Err(LoadError::TypeConflict { .. })
        ));
        assert_eq!(cache.ref_count("theme"), Some(1));
        assert_eq!(cache.asset_type("theme"), Some(AssetTypeId::of::<Music>()));
        assert_eq!(cache.names(), vec!["theme".to_string()]);
    }

    #[test]
    fn concurrent_refcounting_is_consistent() {
        let cache = AssetCache::default();
        cache.insert("shared", Arc::new(Music), 1).unwrap();

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        cache.add_ref("shared").unwrap();
                        cache.release("shared").unwrap();
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(cache.ref_count("shared"), Some(1));
    }

    #[derive(TypeUuid)]
    #[uuid = "8b7c6d5e-4f3a-4b2c-8d1e-0f9a8b7c6d62"]
    struct Crashing;

    impl Asset for Crashing {
        fn dispose(&mut self) -> LoaderResult<()> {
            panic!("voice already freed");
        }
    }

    #[test]
    fn panicking_dispose_still_removes_entry() {
        let cache = AssetCache::default();
        cache.insert("crash.wav", Arc::new(Crashing), 1).unwrap();
        assert_eq!(cache.release("crash.wav").unwrap(), 0);
        assert!(!cache.is_loaded("crash.wav"));
        assert!(cache.is_empty());
    }

    #[test]
    fn add_ref_refuses_to_overflow() {
        let cache = AssetCache::default();
        cache.insert("loop.wav", Arc::new(Music), u32::MAX).unwrap();
        assert!(matches!(
            cache.add_ref("loop.wav"),
            Err(LoadError::RefCountOverflow { .. })
        ));
        assert_eq!(cache.ref_count("loop.wav"), Some(u32::MAX));
        assert_eq!(cache.release("loop.wav").unwrap(), u32::MAX - 1);
    }
}
