use std::path::PathBuf;

use thiserror::Error;

/// Result type local to simcache-store.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{op} failed for {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize results for {}: {reason}", .path.display())]
    Serialize { path: PathBuf, reason: String },

    #[error("corrupt artifact {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
}

impl StoreError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(path)
        } else {
            StoreError::Io { op, path, source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
