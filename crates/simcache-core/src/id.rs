//! Recipe identity: kind tag plus fingerprint.
//!
//! The identity doubles as the on-disk directory name `<kind>_<fingerprint>`,
//! which is what makes the store content-addressed per recipe.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::Fingerprint;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipeId {
    kind: String,
    fingerprint: Fingerprint,
}

impl RecipeId {
    /// Kinds must be non-empty and safe as a path component; underscores
    /// are allowed since parsing splits on the last one.
    pub fn new(kind: impl Into<String>, fingerprint: Fingerprint) -> Result<Self> {
        let kind = kind.into();
        validate_kind(&kind)?;
        Ok(Self { kind, fingerprint })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn dir_name(&self) -> String {
        format!("{}_{}", self.kind, self.fingerprint)
    }
}

/// A kind is non-empty ASCII alphanumerics, `_` or `-`.
pub fn validate_kind(kind: &str) -> Result<()> {
    let ok = !kind.is_empty()
        && kind
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidId(format!("recipe kind '{kind}'")))
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind, self.fingerprint)
    }
}

impl FromStr for RecipeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, fp) = s
            .rsplit_once('_')
            .ok_or_else(|| Error::InvalidId(s.to_string()))?;
        let fingerprint = fp.parse().map_err(|_| Error::InvalidId(s.to_string()))?;
        Self::new(kind, fingerprint)
    }
}
