use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The geometry could not produce a content digest; no fallback
    /// fingerprint is ever synthesized.
    #[error("fingerprint unavailable: {0}")]
    Fingerprint(#[from] DigestError),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid recipe id '{0}'")]
    InvalidId(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialize(e.to_string())
    }
}

/// Failure of a geometry's own content digest.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DigestError {
    #[error("cell '{cell}': port '{port}' references unknown layer '{layer}'")]
    UnresolvedLayer {
        cell: String,
        port: String,
        layer: String,
    },

    #[error("geometry encoding failed: {0}")]
    Encode(String),

    /// Free-form failure reported by an external geometry implementation.
    #[error("{0}")]
    Backend(String),
}
