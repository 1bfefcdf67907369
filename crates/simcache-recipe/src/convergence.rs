//! Convergence bookkeeping for a single simulation setup.
//!
//! The tracker pins the fingerprint of its configuration at construction and
//! keeps a `convergence` result bag in the matching directory.

use std::path::{Path, PathBuf};

use simcache_core::configuration::Configuration;
use simcache_core::hash::{fingerprint, Fingerprint};
use simcache_core::id::RecipeId;
use simcache_store::{ResultStore, Results, StoreError};

use crate::error::{RecipeError, Result};
use crate::freshness::{is_live, Freshness};

pub const CONVERGENCE_PREFIX: &str = "convergence";

#[derive(Debug)]
pub struct ConvergenceTracker {
    id: RecipeId,
    dirpath: PathBuf,
    configuration: Configuration,
    store: ResultStore,
    results: Results,
}

impl ConvergenceTracker {
    /// Fingerprint `configuration` and create `<root>/<kind>_<fingerprint>/`.
    pub fn new(
        kind: &str,
        configuration: Configuration,
        root: impl AsRef<Path>,
        store: ResultStore,
    ) -> Result<Self> {
        let root = root.as_ref();
        let fp = fingerprint(&configuration).map_err(|source| RecipeError::Fingerprint {
            kind: kind.to_string(),
            root: root.to_path_buf(),
            source,
        })?;
        let id = RecipeId::new(kind, fp).map_err(|e| RecipeError::Config {
            kind: kind.to_string(),
            reason: e.to_string(),
        })?;
        let dirpath = root.join(id.dir_name());
        store
            .storage()
            .create_dir_all(&dirpath)
            .map_err(|source| RecipeError::Store {
                id: id.clone(),
                dir: dirpath.clone(),
                source,
            })?;

        Ok(Self {
            results: Results::new(CONVERGENCE_PREFIX, &dirpath),
            id,
            dirpath,
            configuration,
            store,
        })
    }

    pub fn id(&self) -> &RecipeId {
        &self.id
    }

    /// Fingerprint taken at construction.
    pub fn anchor(&self) -> Fingerprint {
        self.id.fingerprint()
    }

    pub fn dirpath(&self) -> &Path {
        &self.dirpath
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    pub fn results(&self) -> &Results {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut Results {
        &mut self.results
    }

    /// False once the configuration has been mutated since construction.
    pub fn is_live(&self) -> bool {
        is_live(self.anchor(), &self.configuration)
    }

    /// Stamp the current configuration onto the results and persist them.
    ///
    /// Refused once the configuration has been mutated: the directory is
    /// named after the construction-time fingerprint.
    pub fn save(&mut self) -> Result<PathBuf> {
        if !self.is_live() {
            return Err(RecipeError::Mutated {
                id: self.id.clone(),
                dir: self.dirpath.clone(),
            });
        }
        let snapshot = self
            .configuration
            .snapshot()
            .map_err(|source| RecipeError::Fingerprint {
                kind: self.id.kind().to_string(),
                root: self.dirpath.clone(),
                source,
            })?;
        self.results.stamp(snapshot, self.anchor());
        self.store
            .save(&self.results, &self.dirpath)
            .map_err(|source| self.store_error(source))
    }

    /// Replace the in-memory results with the stored ones. Returns `false`
    /// when nothing is stored yet.
    pub fn load(&mut self) -> Result<bool> {
        match self.store.load(CONVERGENCE_PREFIX, &self.dirpath) {
            Ok(stored) => {
                self.results = stored;
                Ok(true)
            }
            Err(e) if e.is_not_found() => Ok(false),
            Err(source) => Err(self.store_error(source)),
        }
    }

    /// Whether stored results exist and were computed from the current
    /// configuration. Unreadable artifacts count as a mismatch.
    pub fn matches_stored(&self) -> bool {
        if !self.is_live() || !self.store.available(CONVERGENCE_PREFIX, &self.dirpath) {
            return false;
        }
        match self.store.load(CONVERGENCE_PREFIX, &self.dirpath) {
            Ok(stored) => Freshness::check(&self.configuration, &stored).is_fresh(),
            Err(_) => false,
        }
    }

    pub fn needs_convergence(&self, force: bool) -> bool {
        force || !self.is_live() || !self.matches_stored()
    }

    fn store_error(&self, source: StoreError) -> RecipeError {
        RecipeError::Store {
            id: self.id.clone(),
            dir: self.dirpath.clone(),
            source,
        }
    }
}
