//! Retry orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for per-atom semantic retries.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum oracle attempts per atom. Default: 3.
    pub max_attempts_per_atom: Option<u8>,
    /// Temperatures per attempt, descending. Default: [0.7, 0.5, 0.3].
    /// When shorter than the attempt count, the last entry repeats.
    pub temperature_schedule: Option<Vec<f64>>,
    /// Context lines quoted around each offending line in feedback prompts.
    /// Default: 2.
    pub feedback_context_lines: Option<u32>,
}

impl RetryConfig {
    pub fn effective_max_attempts(&self) -> u8 {
        self.max_attempts_per_atom.unwrap_or(3)
    }

    pub fn effective_temperature_schedule(&self) -> Vec<f64> {
        self.temperature_schedule
            .clone()
            .unwrap_or_else(|| vec![0.7, 0.5, 0.3])
    }

    /// Temperature for a 1-based attempt number.
    pub fn temperature_for_attempt(&self, attempt: u8) -> f64 {
        let schedule = self.effective_temperature_schedule();
        let idx = (attempt.max(1) as usize - 1).min(schedule.len().saturating_sub(1));
        schedule.get(idx).copied().unwrap_or(0.3)
    }

    pub fn effective_feedback_context_lines(&self) -> u32 {
        self.feedback_context_lines.unwrap_or(2)
    }
}
