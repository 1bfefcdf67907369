use std::path::PathBuf;

use thiserror::Error;

use simcache_core::id::RecipeId;
use simcache_store::StoreError;

/// Error type evaluators return; passed through to callers unchanged.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, RecipeError>;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("{kind}: invalid recipe: {reason}")]
    Config { kind: String, reason: String },

    #[error("{kind} under {}: cannot fingerprint configuration: {source}", .root.display())]
    Fingerprint {
        kind: String,
        root: PathBuf,
        #[source]
        source: simcache_core::error::Error,
    },

    #[error("{id} at {}: {source}", .dir.display())]
    Store {
        id: RecipeId,
        dir: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("{id} at {}: evaluation failed: {source}", .dir.display())]
    Evaluation {
        id: RecipeId,
        dir: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("{id} at {}: configuration changed since construction", .dir.display())]
    Mutated { id: RecipeId, dir: PathBuf },

    #[error("{kind}: dependency failed: {source}")]
    Dependency {
        kind: String,
        #[source]
        source: Box<RecipeError>,
    },
}

impl RecipeError {
    /// Directory of the recipe the failure originated in, when known.
    pub fn dir(&self) -> Option<&std::path::Path> {
        match self {
            RecipeError::Store { dir, .. }
            | RecipeError::Evaluation { dir, .. }
            | RecipeError::Mutated { dir, .. } => Some(dir),
            RecipeError::Dependency { source, .. } => source.dir(),
            RecipeError::Config { .. } | RecipeError::Fingerprint { .. } => None,
        }
    }

    /// The innermost failure, looking through dependency wrapping.
    pub fn root_cause(&self) -> &RecipeError {
        match self {
            RecipeError::Dependency { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
