//! Error taxonomy for the whole pipeline.
//!
//! Recoverable kinds (validation failures, oracle transport/semantic
//! errors) are handled inside the retry loop and oracle client and never
//! surface to the plan outcome; structural kinds fail one task; graph
//! degradation warns or aborts; cancellation and deadlines surface in the
//! final summary.

pub mod decompose_error;
pub mod engine_error;
pub mod error_code;
pub mod graph_error;
pub mod oracle_error;
pub mod parse_error;
pub mod validate_error;

pub use decompose_error::DecomposeError;
pub use engine_error::EngineError;
pub use error_code::MosaicErrorCode;
pub use graph_error::GraphError;
pub use oracle_error::OracleError;
pub use parse_error::ParseError;
pub use validate_error::ValidateError;
