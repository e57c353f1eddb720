//! Phabricator Maniphest client.

pub mod transport;

pub use transport::{
    ConduitParams, ConduitTransport, HttpConduitTransport, parse_conduit_response,
};

use crate::config::DestinationConfig;
use crate::error::{MigrateError, MigrateResult};
use crate::types::{DestinationTask, Transaction};
use serde_json::Value;
use std::time::Duration;

/// Flatten a list parameter into `name[0]=…, name[1]=…`.
pub fn encode_list(name: &str, values: &[String]) -> ConduitParams {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("{}[{}]", name, i), v.clone()))
        .collect()
}

/// Flatten transactions into `transactions[i][type]` / `transactions[i][value]` pairs.
pub fn encode_transactions(transactions: &[Transaction]) -> ConduitParams {
    let mut params = Vec::new();
    for (i, transaction) in transactions.iter().enumerate() {
        let prefix = format!("transactions[{}]", i);
        params.push((format!("{}[type]", prefix), transaction.kind().to_string()));
        match transaction {
            Transaction::Comment(body) => {
                params.push((format!("{}[value]", prefix), body.clone()));
            }
            Transaction::RemoveSubscribers(phids) => {
                params.extend(encode_list(&format!("{}[value]", prefix), phids));
            }
        }
    }
    params
}

/// Typed access to Maniphest.
#[derive(Debug)]
pub struct ManiphestClient<T> {
    transport: T,
}

impl ManiphestClient<HttpConduitTransport> {
    /// Build an HTTP client from configuration.
    pub fn from_config(
        config: &DestinationConfig,
        timeout: Option<Duration>,
    ) -> MigrateResult<Self> {
        let transport = HttpConduitTransport::new(&config.url, &config.api_token, timeout)?;
        Ok(Self::new(transport))
    }
}

impl<T: ConduitTransport> ManiphestClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `maniphest.createtask`. Returns the new task's PHID.
    pub async fn create_task(
        &self,
        title: &str,
        description: &str,
        project_phids: &[String],
    ) -> MigrateResult<String> {
        let method = "maniphest.createtask";
        let mut params = vec![
            ("title".to_string(), title.to_string()),
            ("description".to_string(), description.to_string()),
        ];
        params.extend(encode_list("projectPHIDs", project_phids));

        let result = self.transport.call(method, params).await?;
        result
            .get("phid")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| MigrateError::malformed(method, "result has no phid"))
    }

    /// `maniphest.query` filtered by project, in the order Conduit returned them.
    pub async fn query_tasks(&self, project_phids: &[String]) -> MigrateResult<Vec<DestinationTask>> {
        let method = "maniphest.query";
        let result = self
            .transport
            .call(method, encode_list("projectPHIDs", project_phids))
            .await?;
        decode_query_result(method, result)
    }

    /// `maniphest.edit` on one object.
    pub async fn edit(
        &self,
        object_identifier: &str,
        transactions: &[Transaction],
    ) -> MigrateResult<Value> {
        let mut params = vec![(
            "objectIdentifier".to_string(),
            object_identifier.to_string(),
        )];
        params.extend(encode_transactions(transactions));
        self.transport.call("maniphest.edit", params).await
    }
}

/// `maniphest.query` answers with an object keyed by PHID, or `[]` when empty.
///
/// The key is the task handle; it fills in `phid` for records that omit it.
fn decode_query_result(method: &str, result: Value) -> MigrateResult<Vec<DestinationTask>> {
    let records: Vec<Value> = match result {
        Value::Null => Vec::new(),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, mut record)| {
                if let Value::Object(fields) = &mut record {
                    if !fields.get("phid").is_some_and(Value::is_string) {
                        fields.insert("phid".to_string(), Value::String(key));
                    }
                }
                record
            })
            .collect(),
        Value::Array(items) => items,
        other => {
            return Err(MigrateError::malformed(
                method,
                format!("expected object or array, got {}", other),
            ));
        }
    };

    records
        .into_iter()
        .map(|record| serde_json::from_value(record).map_err(|e| MigrateError::malformed(method, e)))
        .collect()
}
