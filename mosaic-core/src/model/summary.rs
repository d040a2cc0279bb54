//! Final plan summary.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::atom::ReviewReason;
use super::validation::ValidationResult;
use crate::types::identifiers::{AtomId, PlanId, TaskId};

/// Terminal status of a plan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanStatus {
    Completed,
    /// Wave failure ratio or graph degradation forced an abort.
    Aborted,
    Cancelled,
    /// Cancellation did not finish within the grace period.
    DegradedShutdown,
}

/// One needs-review entry in the summary: enough to act on without logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeedsReviewEntry {
    pub atom_id: AtomId,
    pub reason: ReviewReason,
    pub attempts: u8,
    /// Most recent validation result for the atom, if any attempt ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_validation: Option<ValidationResult>,
}

/// Wall-clock durations of the pipeline stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageDurations {
    pub decompose: Duration,
    pub graph_build: Duration,
    pub execution: Duration,
    pub total: Duration,
}

/// Final summary emitted once per plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub plan_id: PlanId,
    pub status: PlanStatus,
    pub total_atoms: usize,
    pub accepted: usize,
    pub needs_review: Vec<NeedsReviewEntry>,
    pub level_4_passed: bool,
    pub durations: StageDurations,
    /// attempts used → number of atoms that succeeded with that many.
    /// BTreeMap keeps the serialized histogram ordered.
    pub attempts_histogram: BTreeMap<u8, usize>,
    /// Edges removed during cycle breaking, as (from, to, kind-name).
    #[serde(default)]
    pub broken_edges: Vec<(AtomId, AtomId, String)>,
    /// Tasks that failed structurally (no scaffold, parse error) with the
    /// error rendered; their atoms were never created.
    #[serde(default)]
    pub failed_tasks: Vec<(TaskId, String)>,
}

impl PlanSummary {
    pub fn needs_review_count(&self) -> usize {
        self.needs_review.len()
    }
}
