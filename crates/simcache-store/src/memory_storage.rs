//! In-memory storage backend for tests and dry runs.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{Result, StoreError};
use crate::storage::Storage;

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

/// Storage backed by a map from path to bytes.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the maps half-updated.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().files.contains_key(path)
    }

    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    fn register_parents(inner: &mut Inner, path: &Path) {
        let mut cur = path.parent();
        while let Some(p) = cur {
            if p.as_os_str().is_empty() {
                break;
            }
            inner.dirs.insert(p.to_path_buf());
            cur = p.parent();
        }
    }
}

impl Storage for MemoryStorage {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut inner = self.lock();
        Self::register_parents(&mut inner, path);
        inner.files.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    fn exists(&self, path: &Path) -> bool {
        self.contains(path)
    }

    fn delete(&self, path: &Path) -> Result<()> {
        self.lock().files.remove(path);
        Ok(())
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let inner = self.lock();
        let children: BTreeSet<PathBuf> = inner
            .files
            .keys()
            .chain(inner.dirs.iter())
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect();
        Ok(children.into_iter().collect())
    }

    fn create_dir_all(&self, dir: &Path) -> Result<()> {
        let mut inner = self.lock();
        Self::register_parents(&mut inner, &dir.join("_"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_write_read() {
        let storage = MemoryStorage::new();
        let path = Path::new("root/Kind_1/recipe_results.json");
        storage.write(path, b"{}").unwrap();
        assert_eq!(storage.read(path).unwrap(), b"{}");
        assert!(storage.exists(path));
    }

    #[test]
    fn test_memory_storage_delete() {
        let storage = MemoryStorage::new();
        let path = Path::new("test/file.txt");
        storage.write(path, b"data").unwrap();
        storage.delete(path).unwrap();
        assert!(!storage.contains(path));
        assert!(storage.read(path).unwrap_err().is_not_found());
    }

    #[test]
    fn test_memory_storage_list_direct_children() {
        let storage = MemoryStorage::new();
        storage.write(Path::new("root/A_1/recipe_results.json"), b"1").unwrap();
        storage.write(Path::new("root/B_2/recipe_results.json"), b"2").unwrap();
        storage.create_dir_all(Path::new("root/C_3")).unwrap();

        let children = storage.list(Path::new("root")).unwrap();
        assert_eq!(
            children,
            vec![
                PathBuf::from("root/A_1"),
                PathBuf::from("root/B_2"),
                PathBuf::from("root/C_3"),
            ]
        );
        assert_eq!(storage.file_count(), 2);
    }
}
