//! Confidence scoring and review routing configuration.

use serde::{Deserialize, Serialize};

/// Configuration for confidence-based review routing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReviewConfig {
    /// Atoms below this confidence are queued for review. Default: 0.7.
    pub confidence_threshold: Option<f64>,
    /// Maximum candidate fixes included in an AI hint. Default: 3.
    pub max_hint_fixes: Option<usize>,
}

impl ReviewConfig {
    pub fn effective_confidence_threshold(&self) -> f64 {
        self.confidence_threshold.unwrap_or(0.7)
    }

    pub fn effective_max_hint_fixes(&self) -> usize {
        self.max_hint_fixes.unwrap_or(3)
    }
}
