use crate::asset_loader::TypedLoader;
use crate::{AssetLoader, DynAssetLoader};
use lading_base::hashing::HashMap;
use lading_base::AssetTypeId;
use std::sync::Arc;

struct RegisteredLoader {
    suffix: String,
    loader: Arc<dyn DynAssetLoader>,
}

/// Maps an asset type, and optionally a filename suffix, to the loader that produces it. When
/// several suffixes registered for a type match a name, the longest one wins. The empty suffix
/// matches every name and acts as the fallback.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: HashMap<AssetTypeId, Vec<RegisteredLoader>>,
}

impl LoaderRegistry {
    pub fn register<L: AssetLoader>(
        &mut self,
        loader: L,
    ) {
        self.register_with_suffix("", loader)
    }

    pub fn register_with_suffix<L: AssetLoader>(
        &mut self,
        suffix: &str,
        loader: L,
    ) {
        self.register_dyn(suffix, Arc::new(TypedLoader(loader)))
    }

    /// Registering the same (type, suffix) pair again replaces the previous loader
    pub fn register_dyn(
        &mut self,
        suffix: &str,
        loader: Arc<dyn DynAssetLoader>,
    ) {
        let asset_type = loader.asset_type();
        log::debug!(
            "Register loader {} for {:?} suffix {:?}",
            loader.loader_name(),
            asset_type,
            suffix
        );

        let loaders = self.loaders.entry(asset_type).or_default();
        if let Some(existing) = loaders.iter_mut().find(|x| x.suffix == suffix) {
            existing.loader = loader;
        } else {
            loaders.push(RegisteredLoader {
                suffix: suffix.to_string(),
                loader,
            });
        }
    }

    pub fn find(
        &self,
        asset_type: AssetTypeId,
        name: &str,
    ) -> Option<Arc<dyn DynAssetLoader>> {
        self.loaders
            .get(&asset_type)?
            .iter()
            .filter(|x| name.ends_with(x.suffix.as_str()))
            .max_by_key(|x| x.suffix.len())
            .map(|x| x.loader.clone())
    }

    pub fn has_loader_for(
        &self,
        asset_type: AssetTypeId,
    ) -> bool {
        self.loaders
            .get(&asset_type)
            .map_or(false, |x| !x.is_empty())
    }

    pub fn loader_count(&self) -> usize {
        self.loaders.values().map(|x| x.len()).sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Asset, AssetCache, LoadRequest, LoaderResult};
    use lading_base::TypeUuid;

    #[derive(TypeUuid)]
    #[uuid = "9c1d4e57-6a0b-4f3e-8c2d-1b7a5e4f3c31"]
    struct Image(&'static str);

    impl Asset for Image {}

    struct ImageLoader(&'static str);

    impl AssetLoader for ImageLoader {
        type Asset = Image;
        type Prepared = ();

        fn load_async(
            &self,
            _request: &LoadRequest,
        ) -> LoaderResult<()> {
            Ok(())
        }

        fn load_sync(
            &self,
            _cache: &AssetCache,
            _request: &LoadRequest,
            _prepared: (),
        ) -> LoaderResult<Image> {
            Ok(Image(self.0))
        }
    }

    fn loader_name(
        registry: &LoaderRegistry,
        name: &str,
    ) -> Option<&'static str> {
        let loader = registry.find(AssetTypeId::of::<Image>(), name)?;
        let file = crate::FileHandle::new(name);
        let parameters = crate::AssetParameters::default();
        let request = LoadRequest {
            name,
            file: &file,
            parameters: &parameters,
        };
        let prepared = loader.load_async(&request).ok()?;
        let asset = loader
            .load_sync(&AssetCache::default(), &request, prepared)
            .ok()?;
        asset.downcast_arc::<Image>().ok().map(|x| x.0)
    }

    #[test]
    fn longest_suffix_wins() {
        let mut registry = LoaderRegistry::default();
        assert!(loader_name(&registry, "a.png").is_none());

        registry.register_with_suffix(".png", ImageLoader("png"));
        assert!(loader_name(&registry, "a.jpg").is_none());
        registry.register(ImageLoader("default"));
        registry.register_with_suffix(".normal.png", ImageLoader("normal"));

        assert_eq!(loader_name(&registry, "a.jpg"), Some("default"));
        assert_eq!(loader_name(&registry, "a.png"), Some("png"));
        assert_eq!(loader_name(&registry, "rock.normal.png"), Some("normal"));
        assert_eq!(registry.loader_count(), 3);
    }

    #[test]
    fn registering_same_suffix_replaces() {
        let mut registry = LoaderRegistry::default();
        registry.register(ImageLoader("first"));
        registry.register(ImageLoader("second"));
        assert_eq!(registry.loader_count(), 1);
        assert_eq!(loader_name(&registry, "x"), Some("second"));
        assert!(registry.has_loader_for(AssetTypeId::of::<Image>()));
    }
}
