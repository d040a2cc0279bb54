//! Plan-level engine errors.

use super::decompose_error::DecomposeError;
use super::error_code::MosaicErrorCode;
use super::graph_error::GraphError;

/// Errors that end or degrade a plan run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("plan cancelled")]
    Cancelled,

    #[error("plan deadline exceeded")]
    DeadlineExceeded,

    #[error("wave {wave} aborted: failure ratio {ratio:.2} reached the abort threshold")]
    WaveAborted { wave: usize, ratio: f64 },

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("decompose error: {0}")]
    Decompose(#[from] DecomposeError),
}

impl MosaicErrorCode for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => "ENGINE_CANCELLED",
            Self::DeadlineExceeded => "ENGINE_DEADLINE_EXCEEDED",
            Self::WaveAborted { .. } => "ENGINE_WAVE_ABORTED",
            Self::Graph(e) => e.error_code(),
            Self::Decompose(e) => e.error_code(),
        }
    }
}
