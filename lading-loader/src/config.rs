use crate::{LoadError, LoadResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct AssetManagerConfigJson {
    asset_root: Option<String>,
    worker_thread_count: Option<usize>,
    require_existing_files: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetManagerConfig {
    /// Asset names are resolved relative to this directory
    pub asset_root: PathBuf,
    /// Zero runs all loader work on the pumping thread
    pub worker_thread_count: usize,
    /// Fail during resolution instead of in the loader when a file is missing
    pub require_existing_files: bool,
}

impl Default for AssetManagerConfig {
    fn default() -> Self {
        AssetManagerConfig {
            asset_root: PathBuf::from("assets"),
            worker_thread_count: 1,
            require_existing_files: false,
        }
    }
}

impl AssetManagerConfig {
    pub fn with_asset_root(
        mut self,
        asset_root: impl Into<PathBuf>,
    ) -> Self {
        self.asset_root = asset_root.into();
        self
    }

    pub fn with_worker_thread_count(
        mut self,
        worker_thread_count: usize,
    ) -> Self {
        self.worker_thread_count = worker_thread_count;
        self
    }

    pub fn with_require_existing_files(
        mut self,
        require_existing_files: bool,
    ) -> Self {
        self.require_existing_files = require_existing_files;
        self
    }

    /// Reads a json config file. Fields left out keep their default values. A relative
    /// asset_root is relative to the directory containing the config file.
    pub fn read_from_path(path: &Path) -> LoadResult<Self> {
        let parent = path.parent().ok_or_else(|| {
            LoadError::IoError(std::sync::Arc::new(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Config path {} has no parent directory", path.display()),
            )))
        })?;
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        let root_path = dunce::canonicalize(parent)?;
        let file_contents = std::fs::read_to_string(path)?;
        let config_file: AssetManagerConfigJson = serde_json::from_str(&file_contents)?;

        let mut config = AssetManagerConfig::default();
        config.asset_root = root_path.join(config_file.asset_root.as_deref().unwrap_or("assets"));
        if let Some(worker_thread_count) = config_file.worker_thread_count {
            config.worker_thread_count = worker_thread_count;
        }
        if let Some(require_existing_files) = config_file.require_existing_files {
            config.require_existing_files = require_existing_files;
        }

        log::info!("Read asset manager config from {:?}: {:?}", path, config);
        Ok(config)
    }
}
