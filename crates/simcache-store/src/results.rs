//! Named bag of result values.
//!
//! Values are arbitrary JSON, so any serde type can be attached under a key.
//! A bag used for freshness tracking also carries the snapshot and
//! fingerprint of the configuration it was computed from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use simcache_core::configuration::ConfigSnapshot;
use simcache_core::hash::Fingerprint;

use crate::error::{Result, StoreError};
use crate::paths::{as_tagged_path, native_path, tag_path};

/// Serialization extension of result artifacts.
pub const RESULTS_EXT: &str = "json";

/// Artifact file name for a prefix: `<prefix>_results.json`.
pub fn results_file_name(prefix: &str) -> String {
    format!("{prefix}_results.{RESULTS_EXT}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Results {
    prefix: String,
    dirpath: PathBuf,
    #[serde(default)]
    values: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "lenient")]
    snapshot: Option<ConfigSnapshot>,
    #[serde(default, deserialize_with = "lenient")]
    fingerprint: Option<Fingerprint>,
}

/// A field written by another schema version reads as absent instead of
/// failing the whole artifact.
fn lenient<'de, D, T>(d: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.and_then(|v| match serde_json::from_value(v) {
        Ok(parsed) => Some(parsed),
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_e, "dropping unreadable recorded field");
            None
        }
    }))
}

impl Results {
    pub fn new(prefix: impl Into<String>, dirpath: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            dirpath: dirpath.into(),
            values: BTreeMap::new(),
            snapshot: None,
            fingerprint: None,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn dirpath(&self) -> &Path {
        &self.dirpath
    }

    pub fn set_dirpath(&mut self, dirpath: impl Into<PathBuf>) {
        self.dirpath = dirpath.into();
    }

    pub fn file_name(&self) -> String {
        results_file_name(&self.prefix)
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dirpath.join(self.file_name())
    }

    /// Attach a serializable value under `key`, replacing any previous one.
    pub fn insert<T: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        let v = serde_json::to_value(value).map_err(|e| StoreError::Serialize {
            path: self.artifact_path(),
            reason: e.to_string(),
        })?;
        self.values.insert(key.into(), v);
        Ok(())
    }

    /// Attach a filesystem path; it is rewritten to the host convention on load.
    pub fn insert_path(&mut self, key: impl Into<String>, path: &Path) {
        self.values.insert(key.into(), tag_path(path));
    }

    /// Typed read; `None` if missing or of another shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.values.get(key).and_then(as_tagged_path).map(native_path)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop all values and the recorded setup, keeping prefix and directory.
    pub fn clear(&mut self) {
        self.values.clear();
        self.snapshot = None;
        self.fingerprint = None;
    }

    /// Record the configuration these results were computed from.
    pub fn stamp(&mut self, snapshot: ConfigSnapshot, fingerprint: Fingerprint) {
        self.snapshot = Some(snapshot);
        self.fingerprint = Some(fingerprint);
    }

    pub fn snapshot(&self) -> Option<&ConfigSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn recorded_fingerprint(&self) -> Option<Fingerprint> {
        self.fingerprint
    }
}
