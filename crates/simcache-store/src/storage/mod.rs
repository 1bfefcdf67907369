//! Storage backends for result artifacts and manifests.
//!
//! - `fs`: local filesystem (default, durable).
//! - `crate::memory_storage`: in-process map, used by tests.

mod fs;
pub use fs::FsStorage;

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Abstract byte storage addressed by path.
pub trait Storage: Send + Sync {
    /// Write bytes to a path. Creates parent directories if needed. A failed
    /// write does not leave a partial file behind.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Write so that readers observe either the old or the new content.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.write(path, bytes)
    }

    /// Read a whole file.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Existence check only; never reads content.
    fn exists(&self, path: &Path) -> bool;

    /// Delete a path. Idempotent (no error if path doesn't exist).
    fn delete(&self, path: &Path) -> Result<()>;

    /// Direct children of a directory, sorted. Missing directory lists empty.
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Create a directory and its parents.
    fn create_dir_all(&self, dir: &Path) -> Result<()>;
}
