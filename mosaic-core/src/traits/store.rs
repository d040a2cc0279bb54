//! Optional persistence contract.
//!
//! The core's correctness is evaluated on in-memory state; hosts that want
//! durability implement this trait. All writes are idempotent upserts keyed
//! by atom id, plus attempt number for retries and validations.

use std::sync::Mutex;

use crate::model::atom::AtomicUnit;
use crate::model::retry::RetryRecord;
use crate::model::review::ReviewItem;
use crate::model::validation::ValidationResult;
use crate::types::identifiers::AtomId;
use crate::FxHashMap;

/// Idempotent persistence for atoms, validations, retries, and review items.
/// Implementations must tolerate repeated upserts of the same key.
pub trait PlanStore: Send + Sync {
    fn upsert_atom(&self, atom: &AtomicUnit);
    fn upsert_validation(&self, attempt: u8, result: &ValidationResult);
    fn upsert_retry(&self, record: &RetryRecord);
    fn upsert_review(&self, item: &ReviewItem);
}

/// In-memory store backing the test suite.
#[derive(Default)]
pub struct MemoryPlanStore {
    atoms: Mutex<FxHashMap<AtomId, AtomicUnit>>,
    validations: Mutex<FxHashMap<(String, u8), ValidationResult>>,
    retries: Mutex<FxHashMap<(AtomId, u8), RetryRecord>>,
    reviews: Mutex<FxHashMap<AtomId, ReviewItem>>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom(&self, id: &AtomId) -> Option<AtomicUnit> {
        self.atoms.lock().ok()?.get(id).cloned()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn retry_count(&self) -> usize {
        self.retries.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn validation_count(&self) -> usize {
        self.validations.lock().map(|v| v.len()).unwrap_or(0)
    }
}

impl PlanStore for MemoryPlanStore {
    fn upsert_atom(&self, atom: &AtomicUnit) {
        if let Ok(mut atoms) = self.atoms.lock() {
            atoms.insert(atom.id.clone(), atom.clone());
        }
    }

    fn upsert_validation(&self, attempt: u8, result: &ValidationResult) {
        if let Ok(mut validations) = self.validations.lock() {
            validations.insert((result.subject.label(), attempt), result.clone());
        }
    }

    fn upsert_retry(&self, record: &RetryRecord) {
        if let Ok(mut retries) = self.retries.lock() {
            retries.insert((record.atom_id.clone(), record.attempt), record.clone());
        }
    }

    fn upsert_review(&self, item: &ReviewItem) {
        if let Ok(mut reviews) = self.reviews.lock() {
            reviews.insert(item.atom_id.clone(), item.clone());
        }
    }
}
