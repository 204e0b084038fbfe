//! Asset byte sources.
//!
//! Caches never touch the filesystem directly; they resolve paths through an
//! [`AssetIo`] handed to them at construction. [`FileSystemIo`] serves a local
//! directory, [`MemoryIo`] serves a preloaded map and counts reads so tests
//! can prove a cache hit performed no IO.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::errors::{Result, RheaError};

/// Resolves asset paths to raw bytes.
pub trait AssetIo: Send + Sync {
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>>;
}

/// Reads assets relative to a root directory on the local filesystem.
pub struct FileSystemIo {
    root: PathBuf,
}

impl FileSystemIo {
    /// Roots the reader at `path`, or at its parent directory when `path`
    /// names a file.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetIo for FileSystemIo {
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.root.join(path))?)
    }
}

/// In-memory asset source with a read counter.
#[derive(Default)]
pub struct MemoryIo {
    files: Mutex<FxHashMap<String, Vec<u8>>>,
    reads: AtomicUsize,
}

impl MemoryIo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, bytes: Vec<u8>) {
        self.files.lock().insert(path.into(), bytes);
    }

    /// Total `read_bytes` calls served so far, hits and misses alike.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl AssetIo for MemoryIo {
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| RheaError::NotFound {
                kind: "asset",
                key: path.to_owned(),
            })
    }
}
