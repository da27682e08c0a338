use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::model::Position;

pub const DEFAULT_MAP_ID: &str = "default";
pub const DEFAULT_MAP_NAME: &str = "My Goal Map";
pub const DEFAULT_COPY_SUFFIX: &str = " (Copy)";
pub const DEFAULT_DUPLICATE_OFFSET: f64 = 50.0;

// Upper bound for historyLimit coming from the UI
const MAX_HISTORY_LIMIT: usize = 1_000;

/// Editor tunables, deserialized from the plain object the UI passes in.
/// Missing fields fall back to defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub history_limit: usize,
    pub duplicate_offset: Position,
    pub copy_suffix: String,
    pub default_map_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            history_limit: DEFAULT_HISTORY_LIMIT,
            duplicate_offset: Position::new(DEFAULT_DUPLICATE_OFFSET, DEFAULT_DUPLICATE_OFFSET),
            copy_suffix: DEFAULT_COPY_SUFFIX.to_string(),
            default_map_name: DEFAULT_MAP_NAME.to_string(),
        }
    }
}

impl EditorConfig {
    /// Clamp values into usable ranges
    pub fn validated(mut self) -> Self {
        let defaults = EditorConfig::default();
        self.history_limit = self.history_limit.clamp(1, MAX_HISTORY_LIMIT);
        if !self.duplicate_offset.x.is_finite() || !self.duplicate_offset.y.is_finite() {
            log::warn!("non-finite duplicateOffset, using default");
            self.duplicate_offset = defaults.duplicate_offset;
        }
        if self.default_map_name.trim().is_empty() {
            self.default_map_name = defaults.default_map_name;
        }
        self
    }
}
