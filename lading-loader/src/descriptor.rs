use crate::{AssetManager, FileHandle, FileResolver, LoadResult};
use lading_base::{AssetTypeId, TypeUuid};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Invoked once when a specific request finishes loading, or when it is unloaded before it was
/// ever promoted out of the pending queue.
pub type LoadedCallback = Arc<dyn Fn(&AssetManager, &str, AssetTypeId) + Send + Sync>;

/// Per-request settings. The config blob is opaque to the manager and is read back by the loader
/// with [`AssetParameters::config`].
#[derive(Clone, Default)]
pub struct AssetParameters {
    config: Option<Arc<dyn Any + Send + Sync>>,
    loaded_callback: Option<LoadedCallback>,
}

impl AssetParameters {
    pub fn with_config<C: Any + Send + Sync>(config: C) -> Self {
        AssetParameters {
            config: Some(Arc::new(config)),
            loaded_callback: None,
        }
    }

    pub fn on_loaded(
        mut self,
        callback: impl Fn(&AssetManager, &str, AssetTypeId) + Send + Sync + 'static,
    ) -> Self {
        self.loaded_callback = Some(Arc::new(callback));
        self
    }

    pub fn config<C: Any + Send + Sync>(&self) -> Option<&C> {
        self.config.as_ref().and_then(|x| x.downcast_ref::<C>())
    }

    pub fn has_config(&self) -> bool {
        self.config.is_some()
    }

    pub fn loaded_callback(&self) -> Option<&LoadedCallback> {
        self.loaded_callback.as_ref()
    }
}

impl fmt::Debug for AssetParameters {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("AssetParameters")
            .field("has_config", &self.config.is_some())
            .field("has_loaded_callback", &self.loaded_callback.is_some())
            .finish()
    }
}

/// Identifies one requested load: what to load, as which type, and with what settings.
#[derive(Clone, Debug)]
pub struct AssetDescriptor {
    name: String,
    asset_type: AssetTypeId,
    parameters: AssetParameters,
    resolved_file: Option<FileHandle>,
}

impl AssetDescriptor {
    pub fn new<T: TypeUuid>(name: impl Into<String>) -> Self {
        Self::with_type(name, AssetTypeId::of::<T>())
    }

    pub fn with_type(
        name: impl Into<String>,
        asset_type: AssetTypeId,
    ) -> Self {
        AssetDescriptor {
            name: name.into(),
            asset_type,
            parameters: AssetParameters::default(),
            resolved_file: None,
        }
    }

    pub fn with_parameters(
        mut self,
        parameters: AssetParameters,
    ) -> Self {
        self.parameters = parameters;
        self
    }

    /// Skip name resolution and load from this file
    pub fn with_file(
        mut self,
        file: FileHandle,
    ) -> Self {
        self.resolved_file = Some(file);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn asset_type(&self) -> AssetTypeId {
        self.asset_type
    }

    pub fn parameters(&self) -> &AssetParameters {
        &self.parameters
    }

    pub fn resolved_file(&self) -> Option<&FileHandle> {
        self.resolved_file.as_ref()
    }

    /// Resolves the file on first use and remembers it
    pub fn resolve(
        &mut self,
        resolver: &dyn FileResolver,
    ) -> LoadResult<FileHandle> {
        if let Some(file) = &self.resolved_file {
            return Ok(file.clone());
        }

        let file = resolver.resolve(&self.name)?;
        self.resolved_file = Some(file.clone());
        Ok(file)
    }
}

impl fmt::Display for AssetDescriptor {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.asset_type)
    }
}
