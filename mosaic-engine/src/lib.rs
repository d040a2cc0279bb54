//! # mosaic-engine
//!
//! Async execution for the Mosaic pipeline: the oracle client with
//! transport retry and backpressure, the four-level hierarchical
//! validator, the retry orchestrator with feedback prompts, the bounded
//! wave executor with cancellation, the confidence scorer, the review
//! queue, and the end-to-end pipeline controller.

pub mod confidence;
pub mod controller;
pub mod executor;
pub mod oracle;
pub mod retry;
pub mod review;
pub mod testing;
pub mod validate;

pub use controller::pipeline::PipelineController;
pub use oracle::client::OracleClient;
pub use oracle::CodeOracle;
