//! HTTP transport using reqwest

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::transport::{Transport, TransportFuture};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status reported by the service for a successful request
pub const STATUS_SUCCESS: &str = "Success";

/// Envelope wrapped around every service response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Service-assigned request id
    pub request_id: String,
    /// `Success` or an error code
    pub status: String,
    /// Human readable outcome
    #[serde(default)]
    pub summary: String,
    /// Operation result (absent on failure)
    #[serde(default)]
    pub result: Option<Value>,
}

impl ResponseEnvelope {
    /// Unwrap the result, turning a non-success status into an API error
    pub fn into_result(self) -> Result<Value> {
        if self.status != STATUS_SUCCESS {
            return Err(Error::Api {
                status: self.status,
                summary: self.summary,
                request_id: self.request_id,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// A transport that POSTs JSON to the service over HTTPS
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: TransportConfig,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport from its configuration
    pub fn new(config: TransportConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::Config("base_url must not be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("auditlog-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// The configuration this transport was built from
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn post(&self, path: &str, payload: Value) -> Result<Value> {
        let url = self.config.endpoint_url(path);
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(&url).json(&payload);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("failed to read response body: {}", e)))?;

        // Error statuses usually still carry an envelope with a useful summary
        match serde_json::from_str::<ResponseEnvelope>(&body) {
            Ok(envelope) => envelope.into_result(),
            Err(_) if !status.is_success() => Err(Error::Http(format!(
                "request to {} failed: {} - {}",
                url, status, body
            ))),
            Err(e) => Err(Error::Http(format!("failed to parse response envelope: {}", e))),
        }
    }
}

impl Transport for HttpTransport {
    fn execute<'a>(&'a self, path: &'a str, payload: Value) -> TransportFuture<'a> {
        Box::pin(self.post(path, payload))
    }
}
