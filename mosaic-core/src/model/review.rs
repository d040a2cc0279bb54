//! Review items for the human-in-the-loop queue.

use serde::{Deserialize, Serialize};

use super::atom::ReviewReason;
use crate::types::identifiers::AtomId;

/// Lifecycle of a review item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewStatus {
    Pending,
    InReview,
    Approved,
    Rejected,
    Regenerated,
}

/// A human decision applied to a queued atom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "action")]
pub enum HumanDecision {
    /// Accept the code of the chosen attempt as-is.
    Approve,
    /// Replace the atom's code; Level 1 re-runs before acceptance.
    Edit { code: String },
    /// Reset attempts and re-enter the retry loop with a hint prepended.
    Regenerate { hint: String },
    /// Terminal rejection; dependants are blocked.
    Reject,
}

/// A low-confidence or exhausted atom awaiting human review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewItem {
    pub atom_id: AtomId,
    /// Confidence at enqueue time; drives priority (1 − confidence).
    pub confidence: f64,
    pub reason: ReviewReason,
    /// AI-composed remediation hint: failure summary, candidate fixes, and
    /// a diff against the best prior attempt. Informational only.
    pub hint: String,
    pub status: ReviewStatus,
    /// Monotonic enqueue sequence; breaks priority ties by age.
    pub enqueued_seq: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<HumanDecision>,
}

impl ReviewItem {
    /// Queue priority: lowest confidence first.
    pub fn priority(&self) -> f64 {
        1.0 - self.confidence
    }
}
