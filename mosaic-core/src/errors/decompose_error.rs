//! Decomposer errors.

use super::error_code::MosaicErrorCode;
use super::parse_error::ParseError;

/// Errors from task decomposition and atomicity gating.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecomposeError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("task {task_id} has no scaffold and no retrievable pattern")]
    ScaffoldMissing { task_id: String },

    #[error("candidate '{name}' violates atomicity: {violations:?}")]
    Atomicity {
        name: String,
        violations: Vec<String>,
    },

    #[error("context bundle for '{name}' is incomplete: {completeness:.2} < {floor:.2}")]
    IncompleteContext {
        name: String,
        completeness: f64,
        floor: f64,
    },
}

impl MosaicErrorCode for DecomposeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(e) => e.error_code(),
            Self::ScaffoldMissing { .. } => "DECOMPOSE_SCAFFOLD_MISSING",
            Self::Atomicity { .. } => "DECOMPOSE_ATOMICITY_VIOLATION",
            Self::IncompleteContext { .. } => "DECOMPOSE_INCOMPLETE_CONTEXT",
        }
    }
}
