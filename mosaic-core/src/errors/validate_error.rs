//! Validator malfunction (level-error), distinct from code failures.

use std::time::Duration;

use super::error_code::MosaicErrorCode;

/// The validator itself failed; the code under test was never judged.
/// Atoms hit by a level error are routed to review with the reason.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidateError {
    #[error("no toolchain registered for language {language}")]
    ToolchainUnavailable { language: String },

    #[error("toolchain crashed during {check}: {message}")]
    ToolchainCrashed { check: String, message: String },

    #[error("validation exceeded its {timeout:?} timeout")]
    Timeout { timeout: Duration },
}

impl MosaicErrorCode for ValidateError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ToolchainUnavailable { .. } => "VALIDATE_TOOLCHAIN_UNAVAILABLE",
            Self::ToolchainCrashed { .. } => "VALIDATE_TOOLCHAIN_CRASHED",
            Self::Timeout { .. } => "VALIDATE_TIMEOUT",
        }
    }
}
