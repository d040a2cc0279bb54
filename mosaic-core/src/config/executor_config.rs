//! Wave executor and plan-level scheduling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the wave executor and plan-level deadlines.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Bounded concurrency within a wave. Default: 100.
    pub max_concurrency_per_wave: Option<usize>,
    /// Aggregate wave failure ratio that triggers cancellation of the wave
    /// and plan abort. Default: 0.30.
    pub wave_failure_abort_ratio: Option<f64>,
    /// Per-wave timeout ceiling in seconds. Default: 3_600.
    pub wave_timeout_ceiling_secs: Option<u64>,
    /// Per-atom share of the wave timeout in seconds. Default: 45.
    pub wave_timeout_per_atom_secs: Option<u64>,
    /// Hard cap for the whole plan in milliseconds. Default: 14_400_000 (4 h).
    pub plan_deadline_ms: Option<u64>,
    /// Grace period for cancellation before reporting degraded shutdown.
    /// Default: 60 s.
    pub cancel_grace_ms: Option<u64>,
}

impl ExecutorConfig {
    pub fn effective_max_concurrency_per_wave(&self) -> usize {
        self.max_concurrency_per_wave.unwrap_or(100)
    }

    pub fn effective_wave_failure_abort_ratio(&self) -> f64 {
        self.wave_failure_abort_ratio.unwrap_or(0.30)
    }

    /// Per-wave timeout: `min(ceiling, atoms · per_atom)`.
    pub fn effective_wave_timeout(&self, wave_size: usize) -> Duration {
        let ceiling = self.wave_timeout_ceiling_secs.unwrap_or(3_600);
        let per_atom = self.wave_timeout_per_atom_secs.unwrap_or(45);
        Duration::from_secs(ceiling.min(wave_size as u64 * per_atom))
    }

    pub fn effective_plan_deadline(&self) -> Duration {
        Duration::from_millis(self.plan_deadline_ms.unwrap_or(14_400_000))
    }

    pub fn effective_cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms.unwrap_or(60_000))
    }
}
