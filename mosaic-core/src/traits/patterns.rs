//! Pattern retrieval and feedback seams.
//!
//! Retrieval is purely advisory context for prompts; feedback is a
//! strictly advisory sink with no effect on pipeline correctness.

use serde::{Deserialize, Serialize};

use crate::types::identifiers::AtomId;

/// A retrieved pattern snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSnippet {
    /// Where the snippet came from (store-specific handle).
    pub source: String,
    pub content: String,
    /// Similarity score reported by the store, higher is closer.
    pub score: f64,
}

/// Supplier of context snippets by query. Treated as a pure function.
pub trait PatternRetriever: Send + Sync {
    /// Retrieve up to `k` snippets relevant to `query`.
    /// Returns an empty vec by default.
    fn retrieve(&self, query: &str, k: usize) -> Vec<PatternSnippet> {
        let _ = (query, k);
        Vec::new()
    }
}

/// No-op retriever for standalone mode.
pub struct NoOpPatternRetriever;

impl PatternRetriever for NoOpPatternRetriever {}

/// Advisory sink for successful atoms. Implementations may feed a pattern
/// store; the pipeline never reads anything back.
pub trait PatternFeedback: Send + Sync {
    /// Report an accepted atom's code. Default: drop it.
    fn report_accepted(&self, atom_id: &AtomId, code: &str) {
        let _ = (atom_id, code);
    }
}

/// No-op feedback sink for standalone mode.
pub struct NoOpPatternFeedback;

impl PatternFeedback for NoOpPatternFeedback {}
