//! Configuration for every pipeline subsystem.
//!
//! Each subsystem has its own config struct with optional fields and
//! `effective_*()` accessors supplying defaults, aggregated into
//! [`MosaicConfig`], which is TOML-loadable.

pub mod decompose_config;
pub mod executor_config;
pub mod graph_config;
pub mod oracle_config;
pub mod retry_config;
pub mod review_config;
pub mod validation_config;

pub use decompose_config::DecomposeConfig;
pub use executor_config::ExecutorConfig;
pub use graph_config::GraphConfig;
pub use oracle_config::OracleConfig;
pub use retry_config::RetryConfig;
pub use review_config::ReviewConfig;
pub use validation_config::ValidationConfig;

use serde::{Deserialize, Serialize};

/// Aggregated configuration for one pipeline invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    pub decompose: DecomposeConfig,
    pub graph: GraphConfig,
    pub oracle: OracleConfig,
    pub retry: RetryConfig,
    pub executor: ExecutorConfig,
    pub validation: ValidationConfig,
    pub review: ReviewConfig,
}

impl MosaicConfig {
    /// Parse a TOML document; missing sections and fields take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_all_defaults() {
        let config = MosaicConfig::from_toml_str("").unwrap();
        assert_eq!(config.executor.effective_max_concurrency_per_wave(), 100);
        assert_eq!(config.retry.effective_max_attempts(), 3);
        assert_eq!(config.decompose.effective_loc_cap(), 10);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = MosaicConfig::from_toml_str(
            "[executor]\nmax_concurrency_per_wave = 8\n\n[retry]\ntemperature_schedule = [0.9, 0.4]\n",
        )
        .unwrap();
        assert_eq!(config.executor.effective_max_concurrency_per_wave(), 8);
        assert_eq!(config.retry.effective_temperature_schedule(), vec![0.9, 0.4]);
        // Untouched sections keep defaults.
        assert_eq!(config.graph.effective_cycle_break_warn_ratio(), 0.05);
    }
}
