//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Recognized options. Everything defaults; unknown keys are rejected so a
/// typo does not silently disable a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Write a `.bm&source` bookmark on every accepted op.
    pub bookmarking: bool,
    /// Advisory op count since the newest snapshot at which a compaction
    /// hint is logged. Snapshot policy itself belongs to the host.
    pub max_log_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bookmarking: false,
            max_log_size: 10,
        }
    }
}

impl EngineConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
