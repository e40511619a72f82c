use crate::{LoadError, LoadResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A concrete file an asset name resolved to
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileHandle {
    path: PathBuf,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileHandle { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|x| x.to_str())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|x| x.to_str())
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        profiling::scope!("FileHandle::read_bytes");
        std::fs::read(&self.path)
    }

    pub fn read_to_string(&self) -> std::io::Result<String> {
        profiling::scope!("FileHandle::read_to_string");
        std::fs::read_to_string(&self.path)
    }
}

/// Maps a logical asset name to the file it is loaded from
pub trait FileResolver: Send + Sync {
    fn resolve(
        &self,
        name: &str,
    ) -> LoadResult<FileHandle>;
}

impl<F> FileResolver for F
where
    F: Fn(&str) -> LoadResult<FileHandle> + Send + Sync,
{
    fn resolve(
        &self,
        name: &str,
    ) -> LoadResult<FileHandle> {
        (self)(name)
    }
}

/// Resolves names relative to a root directory. Absolute names are used as-is.
pub struct DirectoryFileResolver {
    root: PathBuf,
    require_existing: bool,
}

impl DirectoryFileResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryFileResolver {
            root: root.into(),
            require_existing: false,
        }
    }

    /// Fail resolution (rather than the loader's read) when the file is missing
    pub fn require_existing(
        mut self,
        require_existing: bool,
    ) -> Self {
        self.require_existing = require_existing;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileResolver for DirectoryFileResolver {
    fn resolve(
        &self,
        name: &str,
    ) -> LoadResult<FileHandle> {
        let path = self.root.join(name);
        if self.require_existing && !path.exists() {
            return Err(LoadError::FileResolution {
                name: name.to_string(),
                source: Arc::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} does not exist", path.display()),
                )),
            });
        }

        Ok(FileHandle::new(path))
    }
}
