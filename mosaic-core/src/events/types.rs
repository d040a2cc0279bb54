//! Event payload types.
//!
//! Every event carries a timestamp (unix millis) and an opaque metadata
//! bag; atom- and wave-scoped events carry their subject ids.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::atom::AtomStatus;
use crate::model::validation::ValidationLevel;
use crate::types::identifiers::{AtomId, PlanId};

/// Unix timestamp in milliseconds.
pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn default_metadata() -> Value {
    Value::Object(serde_json::Map::new())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomStateChangeEvent {
    pub atom_id: AtomId,
    pub wave_index: Option<usize>,
    pub from: AtomStatus,
    pub to: AtomStatus,
    pub timestamp: u64,
    #[serde(default = "default_metadata")]
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveStartedEvent {
    pub wave_index: usize,
    pub atom_count: usize,
    pub timestamp: u64,
    #[serde(default = "default_metadata")]
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveCompletedEvent {
    pub wave_index: usize,
    pub accepted: usize,
    pub needs_review: usize,
    pub timestamp: u64,
    #[serde(default = "default_metadata")]
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelValidationEvent {
    pub level: ValidationLevel,
    /// Subject label, e.g. `atom:a1` or `module:src/auth.py`.
    pub subject: String,
    pub wave_index: Option<usize>,
    pub timestamp: u64,
    #[serde(default = "default_metadata")]
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryStartedEvent {
    pub atom_id: AtomId,
    pub wave_index: Option<usize>,
    /// 1-based attempt about to run.
    pub attempt: u8,
    pub temperature: f64,
    pub timestamp: u64,
    #[serde(default = "default_metadata")]
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryExhaustedEvent {
    pub atom_id: AtomId,
    pub wave_index: Option<usize>,
    pub attempts: u8,
    pub timestamp: u64,
    #[serde(default = "default_metadata")]
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewQueuedEvent {
    pub atom_id: AtomId,
    pub confidence: f64,
    pub reason: String,
    pub timestamp: u64,
    #[serde(default = "default_metadata")]
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCompletedEvent {
    pub plan_id: PlanId,
    pub status: String,
    pub total_atoms: usize,
    pub accepted: usize,
    pub needs_review: usize,
    pub timestamp: u64,
    #[serde(default = "default_metadata")]
    pub metadata: Value,
}
