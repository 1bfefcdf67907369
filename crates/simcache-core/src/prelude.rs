//! Convenient re-exports for downstream crates.

pub use crate::config::CacheConfig;
pub use crate::configuration::{ConfigSnapshot, Configuration};
pub use crate::error::{DigestError, Error, Result};
pub use crate::geometry::{Component, ContentAddressable, LayerMap, LayerRef, Port};
pub use crate::hash::{fingerprint, Fingerprint, Hash256};
pub use crate::id::RecipeId;
pub use crate::manifest::{DependencyManifest, MANIFEST_FILE};
pub use crate::settings::{SettingValue, Settings};
pub use crate::stack::{LayerLevel, LayerStack, Process, ProcessStep};
