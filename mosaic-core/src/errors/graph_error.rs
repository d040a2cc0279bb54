//! Graph builder errors.

use super::error_code::MosaicErrorCode;

/// Errors from dependency graph construction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    /// More edges were broken than the abort ratio allows; the plan stops.
    #[error("cycle breaking removed {broken} of {total} edges ({ratio:.1}%), above the abort threshold")]
    ExcessiveCycleBreaking {
        broken: usize,
        total: usize,
        /// Percentage, 0–100.
        ratio: f64,
    },

    /// An edge references an atom id absent from the node set.
    #[error("edge {from} → {to} references an unknown atom")]
    DanglingEdge { from: String, to: String },
}

impl MosaicErrorCode for GraphError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ExcessiveCycleBreaking { .. } => "GRAPH_EXCESSIVE_CYCLE_BREAKING",
            Self::DanglingEdge { .. } => "GRAPH_DANGLING_EDGE",
        }
    }
}
