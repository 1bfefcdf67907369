//! Host-independent path values inside result bags.
//!
//! Paths stored in a result are tagged as `{"$path": "<raw>"}`. On load the
//! raw text is rewritten with the host's separator, so an artifact written
//! on Windows loads on Linux and the other way round.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use serde_json::{Map, Value};

/// Key marking a tagged path object.
pub const PATH_TAG: &str = "$path";

/// Rewrite both `/` and `\` to the host separator.
pub fn native_path_string(raw: &str) -> String {
    raw.chars()
        .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
        .collect()
}

pub fn native_path(raw: &str) -> PathBuf {
    PathBuf::from(native_path_string(raw))
}

pub fn tag_path(path: &Path) -> Value {
    let mut m = Map::new();
    m.insert(
        PATH_TAG.to_string(),
        Value::String(path.to_string_lossy().into_owned()),
    );
    Value::Object(m)
}

/// The raw path text if `value` is a tagged path.
pub fn as_tagged_path(value: &Value) -> Option<&str> {
    match value {
        Value::Object(m) if m.len() == 1 => m.get(PATH_TAG).and_then(Value::as_str),
        _ => None,
    }
}

/// Walk `value` and rewrite every tagged path to the host convention.
pub fn normalize_paths(value: &mut Value) {
    match value {
        Value::Object(m) => {
            if m.len() == 1 {
                if let Some(Value::String(raw)) = m.get_mut(PATH_TAG) {
                    *raw = native_path_string(raw);
                    return;
                }
            }
            for v in m.values_mut() {
                normalize_paths(v);
            }
        }
        Value::Array(items) => {
            for v in items {
                normalize_paths(v);
            }
        }
        _ => {}
    }
}
