//! JSON-RPC 2.0 transport to the openLCA IPC endpoint.
//!
//! The wire protocol is owned by the desktop application; this module
//! only frames requests and unwraps responses. [`IpcTransport`] is the
//! seam that tests replace with scripted stubs.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::error::OlcaError;

/// One request/response round trip against the remote store.
#[async_trait]
pub trait IpcTransport: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> Result<Value, OlcaError>;
}

/// HTTP POST transport with a shared `reqwest` client.
pub struct HttpTransport {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

impl HttpTransport {
    /// Creates a transport for the given endpoint URL.
    ///
    /// The HTTP client is configured with a 30 second timeout.
    pub fn new(endpoint: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(
                    "Failed to build HTTP client with timeout: {}. Using default client.",
                    e
                );
                reqwest::Client::new()
            });

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl IpcTransport for HttpTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, OlcaError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    OlcaError::Connection(e.to_string())
                } else {
                    OlcaError::Http(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(OlcaError::Http)?;
        if !status.is_success() {
            return Err(OlcaError::Connection(format!(
                "endpoint returned HTTP {status}: {body}"
            )));
        }

        let parsed: RpcResponse = serde_json::from_str(&body)?;
        if let Some(err) = parsed.error {
            return Err(OlcaError::Remote {
                code: err.code,
                message: err.message,
            });
        }
        // A missing result means "nothing found" for lookups.
        Ok(parsed.result.unwrap_or(Value::Null))
    }
}
