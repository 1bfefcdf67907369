use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::storage::Storage;

/// Local filesystem storage (rooted at the host filesystem).
#[derive(Debug, Clone, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io("mkparent", parent, e))?;
            }
        }
        Ok(())
    }

    /// Create, write, flush. The handle is closed when `f` drops on every
    /// path out of this function; on failure the partial file is removed.
    fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
        let outcome = (|| -> Result<()> {
            let mut f = File::create(path).map_err(|e| StoreError::io("create", path, e))?;
            f.write_all(bytes)
                .map_err(|e| StoreError::io("write", path, e))?;
            f.flush().map_err(|e| StoreError::io("flush", path, e))?;
            Ok(())
        })();
        if outcome.is_err() {
            let _ = fs::remove_file(path);
        }
        outcome
    }
}

impl Storage for FsStorage {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        Self::ensure_parent(path)?;
        Self::write_file(path, bytes)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        Self::ensure_parent(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".{file_name}.tmp"));
        Self::write_file(&tmp, bytes)?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::io("rename", path, e)
        })
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| StoreError::io("read", path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn delete(&self, path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path).map_err(|e| StoreError::io("delete", path, e))?;
        }
        Ok(())
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| StoreError::io("list", dir, e))? {
            let entry = entry.map_err(|e| StoreError::io("list", dir, e))?;
            out.push(entry.path());
        }
        out.sort();
        Ok(out)
    }

    fn create_dir_all(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| StoreError::io("mkdir", dir, e))
    }
}
