//! Graph builder configuration.

use serde::{Deserialize, Serialize};

/// Configuration for normalization, cycle breaking, and wave partitioning.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GraphConfig {
    /// Fraction of edges broken before the plan is marked degraded and a
    /// warning surfaces. Default: 0.05.
    pub cycle_break_warn_ratio: Option<f64>,
    /// Fraction of edges broken beyond which the plan aborts. Default: 0.20.
    pub cycle_break_abort_ratio: Option<f64>,
}

impl GraphConfig {
    pub fn effective_cycle_break_warn_ratio(&self) -> f64 {
        self.cycle_break_warn_ratio.unwrap_or(0.05)
    }

    pub fn effective_cycle_break_abort_ratio(&self) -> f64 {
        self.cycle_break_abort_ratio.unwrap_or(0.20)
    }
}
