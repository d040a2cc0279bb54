//! Hierarchical validator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration shared by the four validation levels.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ValidationConfig {
    /// Per-atom Level 1 timeout in milliseconds. Default: 30_000.
    pub level1_timeout_ms: Option<u64>,
    /// Module cluster size bounds; a module is a cluster of atoms sharing a
    /// target path. Defaults: 10–20. Clusters outside the bounds still
    /// validate; the bounds only inform cohesion scoring.
    pub module_cluster_min: Option<usize>,
    pub module_cluster_max: Option<usize>,
}

impl ValidationConfig {
    pub fn effective_level1_timeout(&self) -> Duration {
        Duration::from_millis(self.level1_timeout_ms.unwrap_or(30_000))
    }

    pub fn effective_module_cluster_min(&self) -> usize {
        self.module_cluster_min.unwrap_or(10)
    }

    pub fn effective_module_cluster_max(&self) -> usize {
        self.module_cluster_max.unwrap_or(20)
    }
}
