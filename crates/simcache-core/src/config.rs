//! Cache configuration that downstream crates can serialize/deserialize.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory under which `<kind>_<fingerprint>` recipe directories live.
    pub root_dir: PathBuf,

    /// Recompute every recipe even when a fresh result is on disk.
    pub force: bool,

    /// Pretty-print JSON result artifacts.
    pub pretty: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./recipes/recipe_runs"),
            force: false,
            pretty: true,
        }
    }
}

impl CacheConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SIMCACHE_ROOT`: root directory for recipe directories
    /// - `SIMCACHE_FORCE`: `1`/`true` to force recomputation
    /// - `SIMCACHE_PRETTY`: `0`/`false` for compact JSON artifacts
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("SIMCACHE_ROOT") {
            if !s.trim().is_empty() {
                cfg.root_dir = PathBuf::from(s);
            }
        }

        if let Ok(s) = std::env::var("SIMCACHE_FORCE") {
            if let Some(v) = parse_flag(&s) {
                cfg.force = v;
            }
        }

        if let Ok(s) = std::env::var("SIMCACHE_PRETTY") {
            if let Some(v) = parse_flag(&s) {
                cfg.pretty = v;
            }
        }

        cfg
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_dir = root.into();
        self
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
