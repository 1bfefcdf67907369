//! Typed key/value settings with a canonical serialization.
//!
//! Semantic entries live in a sorted map, so two settings objects built by
//! inserting the same keys in a different order serialize byte-for-byte the
//! same. Transient entries (handles to in-memory caches, scratch values) sit
//! in a separate overlay that is never serialized and never compared.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex { re: f64, im: f64 },
    Text(String),
    List(Vec<SettingValue>),
    Nested(Settings),
}

impl SettingValue {
    pub fn complex(re: f64, im: f64) -> Self {
        SettingValue::Complex { re, im }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Float(v) => Some(*v),
            SettingValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&Settings> {
        match self {
            SettingValue::Nested(v) => Some(v),
            _ => None,
        }
    }

    /// Relative key path of the first NaN or infinite float inside this value.
    fn non_finite_path(&self) -> Option<String> {
        match self {
            SettingValue::Float(v) if !v.is_finite() => Some(String::new()),
            SettingValue::Complex { re, im } if !(re.is_finite() && im.is_finite()) => {
                Some(String::new())
            }
            SettingValue::List(items) => items
                .iter()
                .enumerate()
                .find_map(|(i, v)| v.non_finite_path().map(|p| format!("[{i}]{p}"))),
            SettingValue::Nested(nested) => nested.non_finite_key().map(|k| format!(".{k}")),
            _ => None,
        }
    }

    /// Convert a JSON value; `None` for JSON null, which carries no setting.
    fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(SettingValue::Bool(b)),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => SettingValue::Int(i),
                None => SettingValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            Value::String(s) => Some(SettingValue::Text(s)),
            Value::Array(items) => Some(SettingValue::List(
                items.into_iter().filter_map(SettingValue::from_json).collect(),
            )),
            Value::Object(map) => Some(SettingValue::Nested(Settings::from_json_map(map))),
        }
    }
}

macro_rules! setting_from {
    ($($t:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$t> for SettingValue {
                fn from(v: $t) -> Self {
                    SettingValue::$variant(<$conv>::from(v))
                }
            }
        )*
    };
}

setting_from!(
    bool => Bool as bool,
    i32 => Int as i64,
    i64 => Int as i64,
    u32 => Int as i64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => Text as String,
    &str => Text as String,
    Settings => Nested as Settings,
);

impl<T: Into<SettingValue>> From<Vec<T>> for SettingValue {
    fn from(v: Vec<T>) -> Self {
        SettingValue::List(v.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, SettingValue>,
    #[serde(skip)]
    transient: BTreeMap<String, SettingValue>,
}

impl PartialEq for Settings {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a semantic entry.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder-style insert of a transient entry.
    pub fn with_transient(mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.set_transient(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Option<SettingValue> {
        self.values.insert(key.into(), value.into())
    }

    pub fn set_transient(
        &mut self,
        key: impl Into<String>,
        value: impl Into<SettingValue>,
    ) -> Option<SettingValue> {
        self.transient.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    pub fn transient(&self, key: &str) -> Option<&SettingValue> {
        self.transient.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<SettingValue> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SettingValue)> {
        self.values.iter()
    }

    /// Key path (`a.b[2]`) of the first NaN or infinite semantic value.
    pub fn non_finite_key(&self) -> Option<String> {
        self.values
            .iter()
            .find_map(|(k, v)| v.non_finite_path().map(|p| format!("{k}{p}")))
    }

    /// Build settings from any serializable schema struct.
    ///
    /// Fields marked `#[serde(skip)]` on the schema never reach the settings,
    /// which is how schema types keep non-semantic state out of the cache key.
    /// Null fields are dropped. Errors if `schema` does not serialize to a map.
    pub fn from_serialize<T: Serialize>(schema: &T) -> Result<Self> {
        match serde_json::to_value(schema)? {
            Value::Object(map) => Ok(Self::from_json_map(map)),
            other => Err(Error::Config(format!(
                "settings schema must serialize to a map, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn from_json_map(map: serde_json::Map<String, Value>) -> Self {
        let values = map
            .into_iter()
            .filter_map(|(k, v)| SettingValue::from_json(v).map(|v| (k, v)))
            .collect();
        Self {
            values,
            transient: BTreeMap::new(),
        }
    }

    /// Canonical JSON text fed to the fingerprint.
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}
