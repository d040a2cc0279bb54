//! HTTP JSON implementation of the oracle interface.
//!
//! Posts `{prompt, temperature, deadline_ms}` and reads `{text}` or
//! `{error: {kind, message}}` per the oracle wire contract.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use mosaic_core::errors::OracleError;

use super::CodeOracle;

/// Wire error payload.
#[derive(Debug, Deserialize)]
struct WireError {
    kind: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<WireError>,
}

/// Oracle speaking the JSON contract over HTTP.
pub struct HttpOracle {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpOracle {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Build with a preconfigured reqwest client (custom pool, proxy).
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    fn map_wire_error(error: WireError) -> OracleError {
        match error.kind.as_str() {
            "transport" => OracleError::Transport { message: error.message },
            "rate_limit" => OracleError::RateLimit { retry_after: None },
            "invalid_request" => OracleError::InvalidRequest { message: error.message },
            "server" => OracleError::Server { message: error.message },
            other => OracleError::Server {
                message: format!("unknown error kind {other}: {}", error.message),
            },
        }
    }
}

#[async_trait]
impl CodeOracle for HttpOracle {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f64,
        deadline: Duration,
    ) -> Result<String, OracleError> {
        let body = json!({
            "prompt": prompt,
            "temperature": temperature,
            "deadline_ms": deadline.as_millis() as u64,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(deadline)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::DeadlineExceeded { deadline }
                } else {
                    OracleError::Transport { message: e.to_string() }
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(OracleError::RateLimit { retry_after });
        }
        if status.is_server_error() {
            return Err(OracleError::Server {
                message: format!("HTTP {status}"),
            });
        }
        if status.is_client_error() {
            return Err(OracleError::InvalidRequest {
                message: format!("HTTP {status}"),
            });
        }

        let wire: WireResponse = response.json().await.map_err(|e| OracleError::Semantic {
            message: format!("unparseable oracle response: {e}"),
        })?;

        if let Some(error) = wire.error {
            return Err(Self::map_wire_error(error));
        }
        wire.text.ok_or_else(|| OracleError::Semantic {
            message: "oracle response carried neither text nor error".to_string(),
        })
    }
}
