//! The code oracle seam and its client wrapper.

pub mod client;
pub mod http;

use std::time::Duration;

use async_trait::async_trait;

use mosaic_core::errors::OracleError;

/// The external code producer: `(prompt, temperature) → text`.
///
/// Implementations surface failures through [`OracleError`]; they never
/// retry internally — transport retry is the client wrapper's job, and
/// semantic retry belongs to the retry orchestrator.
#[async_trait]
pub trait CodeOracle: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f64,
        deadline: Duration,
    ) -> Result<String, OracleError>;
}
