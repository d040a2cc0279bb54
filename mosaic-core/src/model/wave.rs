//! Execution waves.

use serde::{Deserialize, Serialize};

use crate::types::identifiers::AtomId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaveStatus {
    Pending,
    Running,
    Done,
    Failed,
}

/// A maximal set of atoms with no intra-set dependencies; all dependencies
/// of members lie in waves with strictly smaller index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wave {
    pub index: usize,
    /// Members in deterministic (lexicographic) order.
    pub atoms: Vec<AtomId>,
    pub status: WaveStatus,
}

impl Wave {
    pub fn new(index: usize, mut atoms: Vec<AtomId>) -> Self {
        atoms.sort();
        Self {
            index,
            atoms,
            status: WaveStatus::Pending,
        }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn contains(&self, atom: &AtomId) -> bool {
        self.atoms.binary_search(atom).is_ok()
    }
}
