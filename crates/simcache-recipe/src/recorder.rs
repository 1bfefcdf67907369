//! Dependency recorder: writes and reads `recipe_dependencies.txt`.

use std::path::{Path, PathBuf};

use simcache_core::id::RecipeId;
use simcache_core::manifest::{DependencyManifest, MANIFEST_FILE};
use simcache_store::{Storage, StoreError};

use crate::error::{RecipeError, Result};
use crate::recipe::Recipe;

pub struct DependencyRecorder<'a> {
    storage: &'a dyn Storage,
}

impl<'a> DependencyRecorder<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    pub fn manifest_path(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE)
    }

    /// Atomically replace the manifest in `dir` with `dependencies`, in order.
    pub fn record_ids(&self, dir: &Path, dependencies: &[RecipeId]) -> std::result::Result<PathBuf, StoreError> {
        let path = Self::manifest_path(dir);
        let text = DependencyManifest::from_ids(dependencies).render();
        self.storage.write_atomic(&path, text.as_bytes())?;
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), count = dependencies.len(), "recorded dependencies");
        Ok(path)
    }

    /// Record the current dependency list of `recipe` in its directory.
    ///
    /// Fingerprints are recomputed from the recipes' present configurations.
    pub fn record(&self, recipe: &Recipe) -> Result<PathBuf> {
        let id = recipe.id()?;
        let dir = recipe.root().join(id.dir_name());
        let deps = recipe
            .dependencies()
            .iter()
            .map(Recipe::id)
            .collect::<Result<Vec<_>>>()?;
        self.record_ids(&dir, &deps)
            .map_err(|source| RecipeError::Store { id, dir, source })
    }

    /// Dependency directory names recorded in `dir`. A missing manifest is an
    /// error, an empty one is an empty list.
    pub fn read(&self, dir: &Path) -> std::result::Result<Vec<String>, StoreError> {
        let bytes = self.storage.read(&Self::manifest_path(dir))?;
        let text = String::from_utf8(bytes).map_err(|e| StoreError::Corrupt {
            path: Self::manifest_path(dir),
            reason: e.to_string(),
        })?;
        Ok(DependencyManifest::parse(&text).entries)
    }
}
