//! Oracle client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the oracle client wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OracleConfig {
    /// Per-call deadline in milliseconds. Default: 60_000.
    pub timeout_ms: Option<u64>,
    /// Transport retries on transient errors. Default: 3.
    pub transport_retries: Option<u32>,
    /// Initial transport backoff in milliseconds. Default: 200.
    pub backoff_initial_ms: Option<u64>,
    /// Maximum transport backoff in milliseconds. Default: 5_000.
    pub backoff_max_ms: Option<u64>,
    /// Maximum in-flight oracle calls; the executor's semaphore blocks new
    /// atom starts when this is saturated. Default: 100.
    pub max_in_flight: Option<usize>,
}

impl OracleConfig {
    pub fn effective_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(60_000))
    }

    pub fn effective_transport_retries(&self) -> u32 {
        self.transport_retries.unwrap_or(3)
    }

    pub fn effective_backoff_initial(&self) -> Duration {
        Duration::from_millis(self.backoff_initial_ms.unwrap_or(200))
    }

    pub fn effective_backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms.unwrap_or(5_000))
    }

    pub fn effective_max_in_flight(&self) -> usize {
        self.max_in_flight.unwrap_or(100)
    }
}
