//! Conduit transport for Phabricator.

use crate::error::{MigrateError, MigrateResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

const SYSTEM: &str = "Phabricator";

/// Form-encoded request parameters, already flattened to bracket notation.
pub type ConduitParams = Vec<(String, String)>;

/// Calls a Conduit method and returns its `result` payload.
#[async_trait]
pub trait ConduitTransport: Send + Sync {
    async fn call(&self, method: &str, params: ConduitParams) -> MigrateResult<Value>;
}

#[derive(Debug, Deserialize)]
struct ConduitEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_info: Option<String>,
}

/// Unwrap a Conduit response body into its `result`.
pub fn parse_conduit_response(method: &str, body: &str) -> MigrateResult<Value> {
    let envelope: ConduitEnvelope =
        serde_json::from_str(body).map_err(|e| MigrateError::malformed(method, e))?;

    if let Some(code) = envelope.error_code {
        let info = envelope.error_info.unwrap_or_default();
        return Err(MigrateError::rpc(
            SYSTEM,
            method,
            format!("{}: {}", code, info),
        ));
    }

    Ok(envelope.result.unwrap_or(Value::Null))
}

/// HTTP transport posting form-encoded Conduit calls authenticated by `api.token`.
pub struct HttpConduitTransport {
    base_url: String,
    api_token: String,
    client: reqwest::Client,
}

impl fmt::Debug for HttpConduitTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConduitTransport")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

impl HttpConduitTransport {
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        timeout: Option<Duration>,
    ) -> MigrateResult<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("kanboard-migrate/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            MigrateError::configuration(format!("failed to build Phabricator HTTP client: {}", e))
        })?;

        Ok(Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            client,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}/{}", base, method)
    }
}

#[async_trait]
impl ConduitTransport for HttpConduitTransport {
    async fn call(&self, method: &str, mut params: ConduitParams) -> MigrateResult<Value> {
        debug!(method, params = params.len(), "Conduit request");
        params.push(("api.token".to_string(), self.api_token.clone()));

        let response = self
            .client
            .post(self.endpoint(method))
            .form(&params)
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

        parse_conduit_response(method, &body)
    }
}
