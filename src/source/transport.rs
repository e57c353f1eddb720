//! JSON-RPC 2.0 transport for Kanboard.

use crate::error::{MigrateError, MigrateResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

const SYSTEM: &str = "Kanboard";

/// Calls a named Kanboard method and returns its `result` payload.
#[async_trait]
pub trait JsonRpcTransport: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> MigrateResult<Value>;
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Unwrap a JSON-RPC response body into its `result`.
///
/// A `null` result is returned as `Value::Null`; callers decide whether that means "nothing".
pub fn parse_rpc_response(method: &str, body: &str) -> MigrateResult<Value> {
    let envelope: RpcEnvelope =
        serde_json::from_str(body).map_err(|e| MigrateError::malformed(method, e))?;

    if let Some(error) = envelope.error {
        let message = error.message.unwrap_or_else(|| "unknown error".to_string());
        let message = match error.code {
            Some(code) => format!("{} (code {})", message, code),
            None => message,
        };
        return Err(MigrateError::rpc(SYSTEM, method, message));
    }

    Ok(envelope.result.unwrap_or(Value::Null))
}

/// HTTP transport posting JSON-RPC requests with basic authentication.
pub struct HttpJsonRpcTransport {
    endpoint: String,
    user: String,
    token: String,
    next_id: AtomicU64,
    client: reqwest::Client,
}

impl fmt::Debug for HttpJsonRpcTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpJsonRpcTransport")
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl HttpJsonRpcTransport {
    pub fn new(
        endpoint: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
        timeout: Option<Duration>,
    ) -> MigrateResult<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("kanboard-migrate/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            MigrateError::configuration(format!("failed to build Kanboard HTTP client: {}", e))
        })?;

        Ok(Self {
            endpoint: endpoint.into(),
            user: user.into(),
            token: token.into(),
            next_id: AtomicU64::new(1),
            client,
        })
    }
}

#[async_trait]
impl JsonRpcTransport for HttpJsonRpcTransport {
    async fn call(&self, method: &str, params: Value) -> MigrateResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "Kanboard request");

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.token))
            .json(&json!({
                "jsonrpc": "2.0",
                "method": method,
                "id": id,
                "params": params,
            }))
            .send()
            .await
            .map_err(|e| MigrateError::transport(SYSTEM, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MigrateError::transport(SYSTEM, e))?;

        if !status.is_success() {
            return Err(MigrateError::transport(
                SYSTEM,
                format!("{} returned HTTP {}", method, status),
            )
            .with_details(body));
        }

        parse_rpc_response(method, &body)
    }
}
