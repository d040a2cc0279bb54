//! OracleClient — per-call deadline, exponential-backoff transport retry,
//! and an in-flight permit pool providing backpressure to the executor.

use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tokio::sync::Semaphore;

use mosaic_core::config::OracleConfig;
use mosaic_core::errors::OracleError;

use super::CodeOracle;

/// Wraps a [`CodeOracle`] with timeout, transport retry, and backpressure.
///
/// Transient errors (transport, rate limit, server) are retried with
/// exponential backoff and jitter; semantic failures and deadline expiry
/// pass straight through and count as attempt failures upstream.
pub struct OracleClient {
    inner: Arc<dyn CodeOracle>,
    config: OracleConfig,
    permits: Arc<Semaphore>,
}

impl OracleClient {
    pub fn new(inner: Arc<dyn CodeOracle>, config: OracleConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.effective_max_in_flight()));
        Self {
            inner,
            config,
            permits,
        }
    }

    /// Number of in-flight permits currently available.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Generate code. Blocks (asynchronously) while the in-flight pool is
    /// saturated; work is never dropped.
    pub async fn generate(&self, prompt: &str, temperature: f64) -> Result<String, OracleError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| OracleError::Transport {
                message: "oracle permit pool closed".to_string(),
            })?;

        let deadline = self.config.effective_timeout();
        let inner = Arc::clone(&self.inner);

        let call = || {
            let inner = Arc::clone(&inner);
            async move {
                match tokio::time::timeout(deadline, inner.generate(prompt, temperature, deadline))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(OracleError::DeadlineExceeded { deadline }),
                }
            }
        };

        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.config.effective_backoff_initial())
            .with_max_delay(self.config.effective_backoff_max())
            .with_max_times(self.config.effective_transport_retries() as usize)
            .with_jitter();

        let text = call
            .retry(backoff)
            .when(|error: &OracleError| error.is_transient())
            .notify(|error: &OracleError, delay: Duration| {
                tracing::debug!(error = %error, ?delay, "transient oracle error, backing off");
            })
            .await?;

        if text.trim().is_empty() {
            return Err(OracleError::Semantic {
                message: "oracle returned empty text".to_string(),
            });
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FlakyOracle;

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let oracle = Arc::new(FlakyOracle::failing_times(2, "fn ok() {}"));
        let config = OracleConfig {
            backoff_initial_ms: Some(1),
            backoff_max_ms: Some(2),
            ..Default::default()
        };
        let client = OracleClient::new(oracle.clone(), config);

        let text = client.generate("p", 0.7).await.unwrap();
        assert_eq!(text, "fn ok() {}");
        assert_eq!(oracle.calls(), 3);
    }

    #[tokio::test]
    async fn semantic_failures_are_not_retried() {
        let oracle = Arc::new(FlakyOracle::always_empty());
        let config = OracleConfig {
            backoff_initial_ms: Some(1),
            ..Default::default()
        };
        let client = OracleClient::new(oracle.clone(), config);

        let error = client.generate("p", 0.7).await.unwrap_err();
        assert!(matches!(error, OracleError::Semantic { .. }));
        assert_eq!(oracle.calls(), 1);
    }
}
