use crate::{AssetCache, AssetDescriptor, AssetParameters, FileHandle, LoadError, LoadPhase};
use crate::{LoadResult, LoaderResult};
use downcast_rs::DowncastSync;
use lading_base::{AssetTypeId, TypeUuid};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// A fully loaded resource owned by the [`AssetCache`].
pub trait Asset: TypeUuid + Send + Sync + 'static {
    /// Release anything the asset holds outside of normal Rust ownership (GPU handles, audio
    /// voices, ...). Called exactly once, when the last reference is released.
    fn dispose(&mut self) -> LoaderResult<()> {
        Ok(())
    }
}

// Used to store assets of different types in one cache, supports checked downcasting
pub trait DynAsset: DowncastSync {
    fn asset_type(&self) -> AssetTypeId;
    fn type_name(&self) -> &'static str;
    fn dispose(&mut self) -> LoaderResult<()>;
}

downcast_rs::impl_downcast!(sync DynAsset);

impl<T: Asset> DynAsset for T {
    fn asset_type(&self) -> AssetTypeId {
        AssetTypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn dispose(&mut self) -> LoaderResult<()> {
        Asset::dispose(self)
    }
}

/// Everything a loader is told about the asset it is producing
pub struct LoadRequest<'a> {
    pub name: &'a str,
    pub file: &'a FileHandle,
    pub parameters: &'a AssetParameters,
}

impl<'a> LoadRequest<'a> {
    /// Shorthand for the request's configuration blob, if it has the given type
    pub fn config<C: Any + Send + Sync>(&self) -> Option<&C> {
        self.parameters.config::<C>()
    }
}

/// Produces assets of one type. Loading happens in three steps:
///
/// * `dependencies` and `load_async` run on a worker thread and must not touch anything that
///   belongs to the thread that pumps the [`AssetManager`](crate::AssetManager)
/// * `load_sync` runs on the pumping thread, after every dependency is in the cache
///
/// Anything produced by `load_async` is handed to `load_sync` as `Prepared`, so a single loader
/// can serve many loads at once.
pub trait AssetLoader: Send + Sync + 'static {
    type Asset: Asset;
    type Prepared: Send + 'static;

    fn dependencies(
        &self,
        _request: &LoadRequest,
    ) -> LoaderResult<Vec<AssetDescriptor>> {
        Ok(Vec::default())
    }

    fn load_async(
        &self,
        request: &LoadRequest,
    ) -> LoaderResult<Self::Prepared>;

    fn load_sync(
        &self,
        cache: &AssetCache,
        request: &LoadRequest,
        prepared: Self::Prepared,
    ) -> LoaderResult<Self::Asset>;

    /// Called when a load is abandoned after `load_async` produced something
    fn unload_async(
        &self,
        _request: &LoadRequest,
        _prepared: Option<Self::Prepared>,
    ) {
    }
}

pub type PreparedAsset = Box<dyn Any + Send>;

// Type-erased loader so the registry can hold loaders for any asset type and ship them to workers
pub trait DynAssetLoader: Send + Sync {
    fn asset_type(&self) -> AssetTypeId;

    fn loader_name(&self) -> &'static str;

    fn dependencies(
        &self,
        request: &LoadRequest,
    ) -> LoaderResult<Vec<AssetDescriptor>>;

    fn load_async(
        &self,
        request: &LoadRequest,
    ) -> LoaderResult<PreparedAsset>;

    fn load_sync(
        &self,
        cache: &AssetCache,
        request: &LoadRequest,
        prepared: PreparedAsset,
    ) -> LoaderResult<Arc<dyn DynAsset>>;

    fn unload_async(
        &self,
        request: &LoadRequest,
        prepared: Option<PreparedAsset>,
    );
}

pub(crate) struct TypedLoader<L: AssetLoader>(pub L);

impl<L: AssetLoader> DynAssetLoader for TypedLoader<L> {
    fn asset_type(&self) -> AssetTypeId {
        AssetTypeId::of::<L::Asset>()
    }

    fn loader_name(&self) -> &'static str {
        std::any::type_name::<L>()
    }

    fn dependencies(
        &self,
        request: &LoadRequest,
    ) -> LoaderResult<Vec<AssetDescriptor>> {
        self.0.dependencies(request)
    }

    fn load_async(
        &self,
        request: &LoadRequest,
    ) -> LoaderResult<PreparedAsset> {
        let prepared = self.0.load_async(request)?;
        Ok(Box::new(prepared))
    }

    fn load_sync(
        &self,
        cache: &AssetCache,
        request: &LoadRequest,
        prepared: PreparedAsset,
    ) -> LoaderResult<Arc<dyn DynAsset>> {
        let prepared = prepared
            .downcast::<L::Prepared>()
            .map_err(|_| format!("{} received prepared data of the wrong type", self.loader_name()))?;
        let asset = self.0.load_sync(cache, request, *prepared)?;
        Ok(Arc::new(asset))
    }

    fn unload_async(
        &self,
        request: &LoadRequest,
        prepared: Option<PreparedAsset>,
    ) {
        let prepared = prepared.and_then(|x| x.downcast::<L::Prepared>().ok().map(|x| *x));
        self.0.unload_async(request, prepared)
    }
}

// Runs one loader phase, turning both returned errors and panics into LoaderExecution
pub(crate) fn run_loader_phase<T>(
    name: &str,
    phase: LoadPhase,
    f: impl FnOnce() -> LoaderResult<T>,
) -> LoadResult<T> {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(LoadError::loader_execution(name, phase, error)),
        Err(panic) => Err(LoadError::loader_execution(
            name,
            phase,
            format!("loader panicked: {}", panic_message(&*panic)).into(),
        )),
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(TypeUuid)]
    #[uuid = "d8b3f2a4-8a51-4a3c-b2a4-7e5c8b0c1f11"]
    struct Number(u32);

    impl Asset for Number {}

    struct NumberLoader;

    impl AssetLoader for NumberLoader {
        type Asset = Number;
        type Prepared = u32;

        fn load_async(
            &self,
            request: &LoadRequest,
        ) -> LoaderResult<u32> {
            Ok(request.name.parse()?)
        }

        fn load_sync(
            &self,
            _cache: &AssetCache,
            _request: &LoadRequest,
            prepared: u32,
        ) -> LoaderResult<Number> {
            Ok(Number(prepared * 2))
        }
    }

    #[test]
    fn typed_loader_erases_and_restores_types() {
        let loader: Arc<dyn DynAssetLoader> = Arc::new(TypedLoader(NumberLoader));
        assert_eq!(loader.asset_type(), AssetTypeId::of::<Number>());

        let file = FileHandle::new("21");
        let parameters = AssetParameters::default();
        let request = LoadRequest {
            name: "21",
            file: &file,
            parameters: &parameters,
        };

        assert!(loader.dependencies(&request).unwrap().is_empty());
        let prepared = loader.load_async(&request).unwrap();
        let asset = loader
            .load_sync(&AssetCache::default(), &request, prepared)
            .unwrap();
        assert_eq!(asset.asset_type(), AssetTypeId::of::<Number>());
        assert_eq!(asset.downcast_arc::<Number>().ok().unwrap().0, 42);

        let wrong: PreparedAsset = Box::new("not a number");
        assert!(loader
            .load_sync(&AssetCache::default(), &request, wrong)
            .is_err());
    }

    #[test]
    fn loader_panics_become_errors() {
        let result: LoadResult<()> =
            run_loader_phase("boom", LoadPhase::RunningAsyncWork, || panic!("exploded"));
        match result {
            Err(LoadError::LoaderExecution { name, phase, source }) => {
                assert_eq!(name, "boom");
                assert_eq!(phase, LoadPhase::RunningAsyncWork);
                assert!(source.to_string().contains("exploded"));
            }
            _ => panic!("expected a loader execution error"),
        }

        let result = run_loader_phase("parse", LoadPhase::RunningAsyncWork, || {
            Ok("x".parse::<u32>()?)
        });
        assert!(matches!(result, Err(LoadError::LoaderExecution { .. })));
    }
}
