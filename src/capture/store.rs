//! Persistence capability used by the capture sink.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::{DashMap, DashSet};

/// Minimal storage surface: create a destination, write a new artifact.
pub trait ArtifactStore: Send + Sync {
    /// Create `path` if it does not exist. Existing directories are fine.
    fn ensure_directory(&self, path: &Path) -> io::Result<()>;

    /// Write `content` to a fresh artifact at `path`.
    ///
    /// Must fail with [`io::ErrorKind::AlreadyExists`] rather than overwrite.
    fn write_new(&self, path: &Path, content: &[u8]) -> io::Result<()>;
}

impl<T: ArtifactStore + ?Sized> ArtifactStore for Arc<T> {
    fn ensure_directory(&self, path: &Path) -> io::Result<()> {
        (**self).ensure_directory(path)
    }

    fn write_new(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        (**self).write_new(path, content)
    }
}

/// Local filesystem storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl ArtifactStore for FsStore {
    fn ensure_directory(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn write_new(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(content)?;
        file.flush()
    }
}

/// In-memory storage, shareable across clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    artifacts: Arc<DashMap<PathBuf, Vec<u8>>>,
    directories: Arc<DashSet<PathBuf>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.artifacts.get(path).map(|r| r.value().clone())
    }

    pub fn has_directory(&self, path: &Path) -> bool {
        self.directories.contains(path)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ArtifactStore for MemoryStore {
    fn ensure_directory(&self, path: &Path) -> io::Result<()> {
        self.directories.insert(path.to_path_buf());
        Ok(())
    }

    fn write_new(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        match self.artifacts.entry(path.to_path_buf()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("artifact {} already exists", path.display()),
            )),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(content.to_vec());
                Ok(())
            }
        }
    }
}
