//! Kanboard client.
//!
//! Thin typed wrapper over the three JSON-RPC methods the collector needs.

pub mod transport;

pub use transport::{HttpJsonRpcTransport, JsonRpcTransport, parse_rpc_response};

use crate::config::SourceConfig;
use crate::error::{MigrateError, MigrateResult};
use crate::types::{SourceComment, SourceTask, SourceUser};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;

/// Kanboard status filter for open tasks.
pub const STATUS_ACTIVE: &str = "1";

/// Typed access to a Kanboard instance.
#[derive(Debug)]
pub struct KanboardClient<T> {
    transport: T,
}

impl KanboardClient<HttpJsonRpcTransport> {
    /// Build an HTTP client from configuration.
    pub fn from_config(config: &SourceConfig, timeout: Option<Duration>) -> MigrateResult<Self> {
        let transport =
            HttpJsonRpcTransport::new(&config.url, &config.user, &config.token, timeout)?;
        Ok(Self::new(transport))
    }
}

impl<T: JsonRpcTransport> KanboardClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `getAllTasks(project_id, status_id)`.
    pub async fn get_all_tasks(
        &self,
        project_id: &str,
        status_id: &str,
    ) -> MigrateResult<Vec<SourceTask>> {
        let method = "getAllTasks";
        let result = self
            .transport
            .call(method, json!([project_id, status_id]))
            .await?;
        decode_list(method, result)
    }

    /// `getAllComments(task_id)`, in the order Kanboard returns them.
    pub async fn get_all_comments(&self, task_id: &str) -> MigrateResult<Vec<SourceComment>> {
        let method = "getAllComments";
        let result = self.transport.call(method, json!([task_id])).await?;
        decode_list(method, result)
    }

    /// `getUser(user_id)`. Kanboard answers `null` (or `false`) for unknown users.
    pub async fn get_user(&self, user_id: &str) -> MigrateResult<Option<SourceUser>> {
        let method = "getUser";
        let result = self.transport.call(method, json!([user_id])).await?;
        match result {
            Value::Null | Value::Bool(false) => Ok(None),
            other => serde_json::from_value(other)
                .map(Some)
                .map_err(|e| MigrateError::malformed(method, e)),
        }
    }
}

/// Decode a list result. Empty answers come back as `null` or `false` on some Kanboard versions.
fn decode_list<R: DeserializeOwned>(method: &str, result: Value) -> MigrateResult<Vec<R>> {
    match result {
        Value::Null | Value::Bool(false) => Ok(Vec::new()),
        other => serde_json::from_value(other).map_err(|e| MigrateError::malformed(method, e)),
    }
}
