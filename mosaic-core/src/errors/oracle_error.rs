//! Oracle errors, split by retry responsibility: transport errors are the
//! client's to retry with backoff; semantic failures count as attempt
//! failures in the retry orchestrator.

use std::time::Duration;

use super::error_code::MosaicErrorCode;

/// Errors from the external code oracle.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("rate limited")]
    RateLimit { retry_after: Option<Duration> },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("server error: {message}")]
    Server { message: String },

    #[error("oracle call exceeded its {deadline:?} deadline")]
    DeadlineExceeded { deadline: Duration },

    /// The oracle answered, but the text is empty or unusable. Counts as
    /// an attempt failure; never retried at the transport layer.
    #[error("semantic failure: {message}")]
    Semantic { message: String },
}

impl OracleError {
    /// Transient errors are retried by the oracle client with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::RateLimit { .. } | Self::Server { .. }
        )
    }

    /// Wire kind per the oracle interface contract.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::RateLimit { .. } => "rate_limit",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Server { .. } => "server",
            Self::DeadlineExceeded { .. } => "transport",
            Self::Semantic { .. } => "invalid_request",
        }
    }
}

impl MosaicErrorCode for OracleError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "ORACLE_TRANSPORT_ERROR",
            Self::RateLimit { .. } => "ORACLE_RATE_LIMITED",
            Self::InvalidRequest { .. } => "ORACLE_INVALID_REQUEST",
            Self::Server { .. } => "ORACLE_SERVER_ERROR",
            Self::DeadlineExceeded { .. } => "ORACLE_DEADLINE_EXCEEDED",
            Self::Semantic { .. } => "ORACLE_SEMANTIC_FAILURE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_classes_are_transient() {
        assert!(OracleError::Transport { message: "reset".into() }.is_transient());
        assert!(OracleError::RateLimit { retry_after: None }.is_transient());
        assert!(OracleError::Server { message: "500".into() }.is_transient());
    }

    #[test]
    fn semantic_and_deadline_are_not_transient() {
        assert!(!OracleError::Semantic { message: "empty".into() }.is_transient());
        assert!(!OracleError::DeadlineExceeded { deadline: Duration::from_secs(60) }.is_transient());
        assert!(!OracleError::InvalidRequest { message: "bad".into() }.is_transient());
    }
}
