//! Text format of the dependency manifest.
//!
//! One dependency directory name per line, joined with `\n`, no trailing
//! newline. A recipe without dependencies writes an empty file; an empty
//! file is the only representation of "no dependencies".

use serde::{Deserialize, Serialize};

use crate::id::RecipeId;

/// File name of the manifest inside a recipe directory.
pub const MANIFEST_FILE: &str = "recipe_dependencies.txt";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyManifest {
    pub entries: Vec<String>,
}

impl DependencyManifest {
    pub fn from_ids<'a>(ids: impl IntoIterator<Item = &'a RecipeId>) -> Self {
        Self {
            entries: ids.into_iter().map(RecipeId::dir_name).collect(),
        }
    }

    pub fn render(&self) -> String {
        self.entries.join("\n")
    }

    /// Blank lines and surrounding whitespace (including `\r`) are ignored.
    pub fn parse(text: &str) -> Self {
        Self {
            entries: text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Entries that parse as recipe ids; foreign lines are skipped.
    pub fn ids(&self) -> Vec<RecipeId> {
        self.entries.iter().filter_map(|e| e.parse().ok()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
