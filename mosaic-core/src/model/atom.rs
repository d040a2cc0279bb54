//! Atomic units and their status state machine.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::context::ContextBundle;
use super::task::Language;
use crate::types::identifiers::{AtomId, TaskId};

/// Status of an atomic unit.
///
/// Legal transitions:
/// pending → ready → in-flight → validated → accepted, with
/// in-flight → failed → in-flight (retry), failed → needs-review
/// (exhausted), and needs-review → accepted/ready via human decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AtomStatus {
    Pending,
    Ready,
    InFlight,
    Validated,
    Failed,
    NeedsReview,
    Accepted,
    /// Terminal: a human rejected the atom; dependants are blocked.
    Rejected,
}

impl AtomStatus {
    /// Kebab-case display name, also the serde form.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::InFlight => "in-flight",
            Self::Validated => "validated",
            Self::Failed => "failed",
            Self::NeedsReview => "needs-review",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Whether `self → next` is a legal transition of the state machine.
    ///
    /// Status updates go through compare-and-swap against this table; an
    /// illegal transition is a bug in the caller, never applied silently.
    pub fn can_transition_to(&self, next: AtomStatus) -> bool {
        use AtomStatus::*;
        matches!(
            (self, next),
            (Pending, Ready)
                | (Pending, NeedsReview)
                | (Ready, InFlight)
                | (Ready, NeedsReview)
                | (InFlight, Validated)
                | (InFlight, Failed)
                | (InFlight, NeedsReview)
                | (Validated, Accepted)
                | (Validated, NeedsReview)
                | (Failed, InFlight)
                | (Failed, NeedsReview)
                | (NeedsReview, Accepted)
                | (NeedsReview, Ready)
                | (NeedsReview, Rejected)
        )
    }

    /// Terminal states never transition again (except needs-review, which a
    /// human decision can still move).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

/// Why an atom was routed to the review queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewReason {
    /// All retry attempts failed Level 1.
    RetryExhausted,
    /// Confidence fell below the configured threshold.
    LowConfidence,
    /// The validator itself malfunctioned (level-error).
    ValidatorError,
    /// Plan-level cancellation aborted the atom.
    Cancelled,
    /// A dependency ended in needs-review or rejected; never executed.
    Blocked,
    /// The source was too dynamic or reflection-heavy to decompose.
    DynamicSource,
    /// An irreducible leaf exceeded even the relaxed atomicity caps.
    Irreducible,
    /// A wave or plan deadline expired before the atom completed.
    DeadlineExceeded,
}

impl ReviewReason {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RetryExhausted => "retry-exhausted",
            Self::LowConfidence => "low-confidence",
            Self::ValidatorError => "validator-error",
            Self::Cancelled => "cancelled",
            Self::Blocked => "blocked",
            Self::DynamicSource => "dynamic-source",
            Self::Irreducible => "irreducible",
            Self::DeadlineExceeded => "deadline-exceeded",
        }
    }
}

/// The smallest unit of code produced in one oracle call.
///
/// Structural fields (`task_id`, `language`, `depends_on`, `estimated_loc`,
/// `reducible`, `target_path`) are fixed once the dependency graph is built;
/// only status, code, attempts, confidence, and the review reason mutate
/// during execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomicUnit {
    pub id: AtomId,
    pub task_id: TaskId,
    /// Short name of the unit, e.g. the function or block it implements.
    pub name: String,
    pub language: Language,
    /// Estimated lines of code; ≤ 10, or ≤ 15 when `reducible` is false.
    pub estimated_loc: u32,
    /// Cyclomatic complexity of the unit's shape; < 3.0 at acceptance.
    pub complexity: f64,
    pub context: ContextBundle,
    /// Ids of atoms this unit depends on. BTreeSet keeps iteration
    /// deterministic for graph building and summaries.
    pub depends_on: BTreeSet<AtomId>,
    pub status: AtomStatus,
    /// Oracle attempts consumed so far (0..=3).
    pub attempts: u8,
    /// Latest produced code, if any attempt has run.
    pub code: Option<String>,
    /// Confidence in [0, 1]; None until first scored.
    pub confidence: Option<f64>,
    /// False when the decomposer could not split further and the unit
    /// exceeds the normal atomicity caps.
    pub reducible: bool,
    /// Target file path inherited from the owning task; Level 2 clusters
    /// atoms by this path.
    pub target_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_reason: Option<ReviewReason>,
}

impl AtomicUnit {
    /// LOC cap this atom must satisfy at acceptance.
    pub fn loc_cap(&self, atomicity_cap: u32, irreducible_cap: u32) -> u32 {
        if self.reducible {
            atomicity_cap
        } else {
            irreducible_cap
        }
    }

    /// Whether every dependency in `accepted` covers this atom's needs.
    pub fn dependencies_satisfied(&self, accepted: &crate::FxHashSet<AtomId>) -> bool {
        self.depends_on.iter().all(|dep| accepted.contains(dep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_legal() {
        use AtomStatus::*;
        let path = [Pending, Ready, InFlight, Validated, Accepted];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} → {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn retry_and_exhaustion_transitions_are_legal() {
        use AtomStatus::*;
        assert!(InFlight.can_transition_to(Failed));
        assert!(Failed.can_transition_to(InFlight));
        assert!(Failed.can_transition_to(NeedsReview));
    }

    #[test]
    fn needs_review_never_returns_to_in_flight_directly() {
        use AtomStatus::*;
        assert!(!NeedsReview.can_transition_to(InFlight));
        assert!(!NeedsReview.can_transition_to(Failed));
    }

    #[test]
    fn accepted_is_terminal() {
        use AtomStatus::*;
        for next in [Pending, Ready, InFlight, Validated, Failed, NeedsReview, Rejected] {
            assert!(!Accepted.can_transition_to(next));
        }
        assert!(Accepted.is_terminal());
    }
}
