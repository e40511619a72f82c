use crate::LoadPhase;
use lading_base::AssetTypeId;
use std::error::Error;
use std::sync::Arc;

/// Error type returned by loader implementations
pub type BoxedError = Box<dyn Error + Send + Sync + 'static>;
pub type LoaderResult<T> = Result<T, BoxedError>;

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Debug, Clone)]
pub enum LoadError {
    /// The asset is not loaded (or not loaded with the requested type)
    NotFound { name: String },
    /// The name is already loaded or queued with a different type
    TypeConflict {
        name: String,
        existing: AssetTypeId,
        requested: AssetTypeId,
    },
    NoLoader {
        name: String,
        asset_type: AssetTypeId,
    },
    /// A transitive dependency of `name` failed to load
    DependencyLoad {
        name: String,
        dependency: String,
        source: Box<LoadError>,
    },
    /// A loader returned an error (or panicked) while running `phase`
    LoaderExecution {
        name: String,
        phase: LoadPhase,
        source: Arc<dyn Error + Send + Sync + 'static>,
    },
    /// Adding the edge parent -> child would close a cycle
    DependencyCycle { parent: String, child: String },
    FileResolution {
        name: String,
        source: Arc<std::io::Error>,
    },
    AlreadyLoaded { name: String },
    /// Counting one reference per dependency path pushed the count past `u32::MAX`
    RefCountOverflow { name: String },
    IoError(Arc<std::io::Error>),
    JsonError(Arc<serde_json::Error>),
}

impl LoadError {
    pub fn loader_execution(
        name: &str,
        phase: LoadPhase,
        error: BoxedError,
    ) -> Self {
        LoadError::LoaderExecution {
            name: name.to_string(),
            phase,
            source: Arc::from(error),
        }
    }

    /// The innermost error, skipping any dependency wrapping
    pub fn root_cause(&self) -> &LoadError {
        let mut error = self;
        while let LoadError::DependencyLoad { source, .. } = error {
            error = &**source;
        }
        error
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            LoadError::NotFound { .. } => None,
            LoadError::TypeConflict { .. } => None,
            LoadError::NoLoader { .. } => None,
            LoadError::DependencyLoad { ref source, .. } => Some(&**source),
            LoadError::LoaderExecution { ref source, .. } => Some(&**source),
            LoadError::DependencyCycle { .. } => None,
            LoadError::FileResolution { ref source, .. } => Some(&**source),
            LoadError::AlreadyLoaded { .. } => None,
            LoadError::RefCountOverflow { .. } => None,
            LoadError::IoError(ref e) => Some(&**e),
            LoadError::JsonError(ref e) => Some(&**e),
        }
    }
}

impl core::fmt::Display for LoadError {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::fmt::Result {
        match *self {
            LoadError::NotFound { ref name } => write!(fmt, "Asset not loaded: {}", name),
            LoadError::TypeConflict {
                ref name,
                existing,
                requested,
            } => write!(
                fmt,
                "Asset {} is already loaded or queued as type {}, cannot load it as type {}",
                name, existing, requested
            ),
            LoadError::NoLoader {
                ref name,
                asset_type,
            } => write!(
                fmt,
                "No loader registered for type {} (requested by {})",
                asset_type, name
            ),
            LoadError::DependencyLoad {
                ref name,
                ref dependency,
                ref source,
            } => write!(
                fmt,
                "Failed to load {}: dependency {} failed: {}",
                name, dependency, source
            ),
            LoadError::LoaderExecution {
                ref name,
                phase,
                ref source,
            } => write!(fmt, "Loader failed on {} during {:?}: {}", name, phase, source),
            LoadError::DependencyCycle {
                ref parent,
                ref child,
            } => write!(
                fmt,
                "Dependency {} -> {} would create a dependency cycle",
                parent, child
            ),
            LoadError::FileResolution {
                ref name,
                ref source,
            } => write!(fmt, "Could not resolve file for {}: {}", name, source),
            LoadError::AlreadyLoaded { ref name } => write!(fmt, "Asset already loaded: {}", name),
            LoadError::RefCountOverflow { ref name } => {
                write!(fmt, "Reference count of {} overflowed", name)
            }
            LoadError::IoError(ref e) => write!(fmt, "{}", e),
            LoadError::JsonError(ref e) => write!(fmt, "{}", e),
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(error: std::io::Error) -> Self {
        LoadError::IoError(Arc::new(error))
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(error: serde_json::Error) -> Self {
        LoadError::JsonError(Arc::new(error))
    }
}

/// Reported when a cache entry is removed but its asset could not be torn down cleanly. The
/// entry is gone either way.
#[derive(Debug)]
pub enum DisposeError {
    Failed { name: String, source: BoxedError },
    StillShared { name: String, strong_count: usize },
    Panicked { name: String, message: String },
}

impl Error for DisposeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            DisposeError::Failed { ref source, .. } => Some(&**source),
            DisposeError::StillShared { .. } => None,
            DisposeError::Panicked { .. } => None,
        }
    }
}

impl core::fmt::Display for DisposeError {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::fmt::Result {
        match *self {
            DisposeError::Failed {
                ref name,
                ref source,
            } => write!(fmt, "Failed to dispose {}: {}", name, source),
            DisposeError::StillShared {
                ref name,
                strong_count,
            } => write!(
                fmt,
                "Asset {} was unloaded while {} references to it are still held outside the cache",
                name,
                strong_count - 1
            ),
            DisposeError::Panicked {
                ref name,
                ref message,
            } => write!(fmt, "Asset {} panicked while being disposed: {}", name, message),
        }
    }
}
