//! Artifact sink: receives accepted code in acceptance order.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::types::identifiers::AtomId;

/// One emitted artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedArtifact {
    pub atom_id: AtomId,
    pub target_path: String,
    pub code: String,
}

/// Receiver of `{atom_id, target_path, code}` tuples in acceptance order.
pub trait ArtifactSink: Send + Sync {
    fn emit(&self, artifact: EmittedArtifact);
}

/// Collects artifacts in memory, preserving emission order.
#[derive(Default)]
pub struct CollectingSink {
    artifacts: Mutex<Vec<EmittedArtifact>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> Vec<EmittedArtifact> {
        self.artifacts
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactSink for CollectingSink {
    fn emit(&self, artifact: EmittedArtifact) {
        if let Ok(mut artifacts) = self.artifacts.lock() {
            artifacts.push(artifact);
        }
    }
}
