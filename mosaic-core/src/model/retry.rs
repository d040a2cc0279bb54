//! Append-only retry records.

use serde::{Deserialize, Serialize};

use crate::types::identifiers::AtomId;

/// One oracle attempt for one atom. Records are appended in attempt order
/// and never deleted; replaying them with a fixed oracle reproduces the
/// same Level 1 outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryRecord {
    pub atom_id: AtomId,
    /// 1-based attempt number, strictly increasing per atom.
    pub attempt: u8,
    /// Summary of the failure that triggered this attempt; empty on the
    /// first attempt.
    pub failure_summary: String,
    /// The exact prompt sent to the oracle.
    pub prompt: String,
    pub temperature: f64,
    pub success: bool,
    /// Code produced by this attempt, if the oracle returned text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Append-only log of retry records, keyed by atom.
#[derive(Debug, Default)]
pub struct RetryLog {
    records: Vec<RetryRecord>,
}

impl RetryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Attempt numbers per atom must be strictly
    /// increasing; a violation indicates a scheduling bug upstream.
    pub fn append(&mut self, record: RetryRecord) {
        debug_assert!(
            self.last_attempt(&record.atom_id)
                .map(|last| record.attempt > last)
                .unwrap_or(true),
            "attempt numbers must be strictly increasing per atom"
        );
        self.records.push(record);
    }

    pub fn last_attempt(&self, atom: &AtomId) -> Option<u8> {
        self.records
            .iter()
            .filter(|r| &r.atom_id == atom)
            .map(|r| r.attempt)
            .max()
    }

    pub fn for_atom<'a>(&'a self, atom: &'a AtomId) -> impl Iterator<Item = &'a RetryRecord> {
        self.records.iter().filter(move |r| &r.atom_id == atom)
    }

    pub fn all(&self) -> &[RetryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(atom: &str, attempt: u8, success: bool) -> RetryRecord {
        RetryRecord {
            atom_id: AtomId::from(atom),
            attempt,
            failure_summary: String::new(),
            prompt: "p".into(),
            temperature: 0.7,
            success,
            code: None,
        }
    }

    #[test]
    fn records_accumulate_per_atom() {
        let mut log = RetryLog::new();
        log.append(record("a1", 1, false));
        log.append(record("a2", 1, true));
        log.append(record("a1", 2, true));
        assert_eq!(log.for_atom(&AtomId::from("a1")).count(), 2);
        assert_eq!(log.last_attempt(&AtomId::from("a1")), Some(2));
        assert_eq!(log.last_attempt(&AtomId::from("a2")), Some(1));
    }
}
