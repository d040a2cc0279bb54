//! AtomStore — the controller-owned map of all atoms, mutated under
//! per-atom locks with compare-and-swap status transitions.

use std::sync::Mutex;

use mosaic_core::events::types::{now_millis, AtomStateChangeEvent};
use mosaic_core::events::EventDispatcher;
use mosaic_core::model::atom::{AtomStatus, AtomicUnit, ReviewReason};
use mosaic_core::types::identifiers::AtomId;
use mosaic_core::{FxHashMap, FxHashSet};

/// Status mutation failures. Illegal transitions are caller bugs surfaced
/// loudly, not applied silently.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("atom {0} not found")]
    NotFound(AtomId),

    #[error("status is {actual:?}, transition expected {expected:?}")]
    Conflict {
        expected: AtomStatus,
        actual: AtomStatus,
    },

    #[error("illegal transition {from:?} → {to:?}")]
    Illegal { from: AtomStatus, to: AtomStatus },
}

/// All atoms of one plan, each behind its own lock.
///
/// Structural fields are frozen at construction; only status, code,
/// attempts, confidence, and the review reason mutate here.
pub struct AtomStore {
    atoms: FxHashMap<AtomId, Mutex<AtomicUnit>>,
    dispatcher: EventDispatcher,
}

impl AtomStore {
    pub fn new(atoms: Vec<AtomicUnit>, dispatcher: EventDispatcher) -> Self {
        let atoms = atoms
            .into_iter()
            .map(|atom| (atom.id.clone(), Mutex::new(atom)))
            .collect();
        Self { atoms, dispatcher }
    }

    /// Sorted ids of every atom.
    pub fn ids(&self) -> Vec<AtomId> {
        let mut ids: Vec<AtomId> = self.atoms.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Snapshot of one atom.
    pub fn get(&self, id: &AtomId) -> Option<AtomicUnit> {
        self.atoms
            .get(id)
            .and_then(|slot| slot.lock().ok().map(|atom| atom.clone()))
    }

    pub fn status(&self, id: &AtomId) -> Option<AtomStatus> {
        self.atoms
            .get(id)
            .and_then(|slot| slot.lock().ok().map(|atom| atom.status))
    }

    /// Compare-and-swap transition. Fails when the current status is not
    /// `from` or the move is not in the state diagram. Emits
    /// `atom_state_change` on success.
    pub fn transition(
        &self,
        id: &AtomId,
        from: AtomStatus,
        to: AtomStatus,
        wave_index: Option<usize>,
    ) -> Result<(), StoreError> {
        let slot = self
            .atoms
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let mut atom = slot.lock().map_err(|_| StoreError::NotFound(id.clone()))?;

        if atom.status != from {
            return Err(StoreError::Conflict {
                expected: from,
                actual: atom.status,
            });
        }
        if !from.can_transition_to(to) {
            return Err(StoreError::Illegal { from, to });
        }
        atom.status = to;
        drop(atom);

        self.dispatcher.atom_state_change(&AtomStateChangeEvent {
            atom_id: id.clone(),
            wave_index,
            from,
            to,
            timestamp: now_millis(),
            metadata: serde_json::json!({}),
        });
        Ok(())
    }

    /// Move an atom into needs-review from whatever state it is in, when
    /// the state diagram allows it, recording the reason.
    pub fn route_to_review(
        &self,
        id: &AtomId,
        reason: ReviewReason,
        wave_index: Option<usize>,
    ) -> Result<(), StoreError> {
        let slot = self
            .atoms
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let mut atom = slot.lock().map_err(|_| StoreError::NotFound(id.clone()))?;

        let from = atom.status;
        if from == AtomStatus::NeedsReview {
            atom.review_reason.get_or_insert(reason);
            return Ok(());
        }
        if !from.can_transition_to(AtomStatus::NeedsReview) {
            return Err(StoreError::Illegal {
                from,
                to: AtomStatus::NeedsReview,
            });
        }
        atom.status = AtomStatus::NeedsReview;
        atom.review_reason = Some(reason);
        drop(atom);

        self.dispatcher.atom_state_change(&AtomStateChangeEvent {
            atom_id: id.clone(),
            wave_index,
            from,
            to: AtomStatus::NeedsReview,
            timestamp: now_millis(),
            metadata: serde_json::json!({ "reason": reason.name() }),
        });
        Ok(())
    }

    /// Increment the attempt counter, returning the new value.
    pub fn record_attempt(&self, id: &AtomId) -> Option<u8> {
        let slot = self.atoms.get(id)?;
        let mut atom = slot.lock().ok()?;
        atom.attempts = atom.attempts.saturating_add(1);
        Some(atom.attempts)
    }

    /// Reset attempts to zero (human-requested regeneration). Logged.
    pub fn reset_attempts(&self, id: &AtomId) {
        if let Some(slot) = self.atoms.get(id) {
            if let Ok(mut atom) = slot.lock() {
                tracing::info!(atom = %id, prior = atom.attempts, "attempt counter reset");
                atom.attempts = 0;
            }
        }
    }

    pub fn set_code(&self, id: &AtomId, code: String) {
        if let Some(slot) = self.atoms.get(id) {
            if let Ok(mut atom) = slot.lock() {
                atom.code = Some(code);
            }
        }
    }

    pub fn set_confidence(&self, id: &AtomId, confidence: f64) {
        if let Some(slot) = self.atoms.get(id) {
            if let Ok(mut atom) = slot.lock() {
                atom.confidence = Some(confidence.clamp(0.0, 1.0));
            }
        }
    }

    /// Sorted snapshot of every atom.
    pub fn snapshot(&self) -> Vec<AtomicUnit> {
        let mut atoms: Vec<AtomicUnit> = self
            .atoms
            .values()
            .filter_map(|slot| slot.lock().ok().map(|atom| atom.clone()))
            .collect();
        atoms.sort_by(|a, b| a.id.cmp(&b.id));
        atoms
    }

    pub fn count_with_status(&self, status: AtomStatus) -> usize {
        self.atoms
            .values()
            .filter_map(|slot| slot.lock().ok())
            .filter(|atom| atom.status == status)
            .count()
    }

    /// Ids of all accepted atoms.
    pub fn accepted_ids(&self) -> FxHashSet<AtomId> {
        self.atoms
            .values()
            .filter_map(|slot| slot.lock().ok())
            .filter(|atom| atom.status == AtomStatus::Accepted)
            .map(|atom| atom.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::model::context::ContextBundle;
    use mosaic_core::model::task::Language;
    use std::collections::BTreeSet;

    fn atom(id: &str) -> AtomicUnit {
        AtomicUnit {
            id: AtomId::from(id),
            task_id: "t1".into(),
            name: id.to_string(),
            language: Language::Python,
            estimated_loc: 5,
            complexity: 1.0,
            context: ContextBundle::default(),
            depends_on: BTreeSet::new(),
            status: AtomStatus::Pending,
            attempts: 0,
            code: None,
            confidence: None,
            reducible: true,
            target_path: "src/m.py".to_string(),
            review_reason: None,
        }
    }

    #[test]
    fn cas_transition_rejects_stale_expectations() {
        let store = AtomStore::new(vec![atom("a1")], EventDispatcher::new());
        let id = AtomId::from("a1");

        store
            .transition(&id, AtomStatus::Pending, AtomStatus::Ready, Some(0))
            .unwrap();
        let err = store
            .transition(&id, AtomStatus::Pending, AtomStatus::Ready, Some(0))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn illegal_transitions_are_refused() {
        let store = AtomStore::new(vec![atom("a1")], EventDispatcher::new());
        let id = AtomId::from("a1");

        let err = store
            .transition(&id, AtomStatus::Pending, AtomStatus::Accepted, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::Illegal { .. }));
    }

    #[test]
    fn route_to_review_records_reason_once() {
        let store = AtomStore::new(vec![atom("a1")], EventDispatcher::new());
        let id = AtomId::from("a1");

        store
            .route_to_review(&id, ReviewReason::Cancelled, None)
            .unwrap();
        store
            .route_to_review(&id, ReviewReason::RetryExhausted, None)
            .unwrap();
        let snapshot = store.get(&id).unwrap();
        assert_eq!(snapshot.status, AtomStatus::NeedsReview);
        assert_eq!(snapshot.review_reason, Some(ReviewReason::Cancelled));
    }
}
