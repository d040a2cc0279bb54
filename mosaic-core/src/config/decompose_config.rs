//! Decomposer and atomicity configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the decomposer and the atomicity contract.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DecomposeConfig {
    /// LOC cap for an atom. Default: 10.
    pub atomicity_loc_cap: Option<u32>,
    /// LOC cap for irreducible atoms. Default: 15.
    pub irreducible_loc_cap: Option<u32>,
    /// Cyclomatic complexity cap. Default: 3.0.
    pub complexity_cap: Option<f64>,
    /// Context bundle completeness floor. Default: 0.95.
    pub context_completeness_floor: Option<f64>,
    /// Maximum recursion depth before a leaf is declared irreducible.
    /// Default: 16.
    pub max_split_depth: Option<u32>,
    /// Dynamic/reflection marker count at which a task's source is flagged
    /// needs-review instead of decomposed. Default: 2.
    pub dynamic_marker_threshold: Option<u32>,
}

impl DecomposeConfig {
    pub fn effective_loc_cap(&self) -> u32 {
        self.atomicity_loc_cap.unwrap_or(10)
    }

    pub fn effective_irreducible_loc_cap(&self) -> u32 {
        self.irreducible_loc_cap.unwrap_or(15)
    }

    pub fn effective_complexity_cap(&self) -> f64 {
        self.complexity_cap.unwrap_or(3.0)
    }

    pub fn effective_completeness_floor(&self) -> f64 {
        self.context_completeness_floor.unwrap_or(0.95)
    }

    pub fn effective_max_split_depth(&self) -> u32 {
        self.max_split_depth.unwrap_or(16)
    }

    pub fn effective_dynamic_marker_threshold(&self) -> u32 {
        self.dynamic_marker_threshold.unwrap_or(2)
    }
}
