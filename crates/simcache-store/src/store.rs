//! Result store: availability, save, and load of result artifacts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use simcache_core::config::CacheConfig;

use crate::error::{Result, StoreError};
use crate::paths::normalize_paths;
use crate::results::{results_file_name, Results};
use crate::storage::{FsStorage, Storage};

#[derive(Clone)]
pub struct ResultStore {
    storage: Arc<dyn Storage>,
    pretty: bool,
}

impl std::fmt::Debug for ResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStore")
            .field("pretty", &self.pretty)
            .finish_non_exhaustive()
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::fs()
    }
}

impl ResultStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            pretty: true,
        }
    }

    /// Store on the local filesystem.
    pub fn fs() -> Self {
        Self::new(Arc::new(FsStorage::new()))
    }

    pub fn from_config(cfg: &CacheConfig) -> Self {
        Self::fs().with_pretty(cfg.pretty)
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn results_path(prefix: &str, dir: &Path) -> PathBuf {
        dir.join(results_file_name(prefix))
    }

    /// True iff `<dir>/<prefix>_results.json` exists. Does not deserialize.
    pub fn available(&self, prefix: &str, dir: &Path) -> bool {
        let path = Self::results_path(prefix, dir);
        let found = self.storage.exists(&path);
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), found, "results availability");
        found
    }

    /// Persist `results` into `dir`.
    ///
    /// Serialization happens before any file is opened, so an unserializable
    /// bag never leaves an artifact behind; IO failures remove the partial
    /// file in the storage backend.
    pub fn save(&self, results: &Results, dir: &Path) -> Result<PathBuf> {
        let path = Self::results_path(results.prefix(), dir);
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(results)
        } else {
            serde_json::to_vec(results)
        };
        let bytes = encoded.map_err(|e| StoreError::Serialize {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        self.storage.write(&path, &bytes)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "cached results");
        Ok(path)
    }

    /// Load `<prefix>_results.json` from `dir`.
    ///
    /// Tagged path values are rewritten to the host convention, and the
    /// loaded bag's directory is set to `dir` whatever was serialized, since
    /// artifacts may have been copied or moved since they were written.
    pub fn load(&self, prefix: &str, dir: &Path) -> Result<Results> {
        let path = Self::results_path(prefix, dir);
        let bytes = self.storage.read(&path)?;
        let mut raw: Value = serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        normalize_paths(&mut raw);
        let mut results: Results =
            serde_json::from_value(raw).map_err(|e| StoreError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        results.set_dirpath(dir);
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), keys = results.len(), "recalled results");
        Ok(results)
    }
}
