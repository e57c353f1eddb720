//! Configuration types.

use crate::error::{MigrateError, MigrateResult};
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Default Kanboard JSON-RPC user.
pub const DEFAULT_SOURCE_USER: &str = "jsonrpc";

/// Full migration configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub destination: DestinationConfig,

    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Kanboard connection and selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// JSON-RPC endpoint, e.g. `https://todo.example.org/jsonrpc.php`.
    #[serde(default)]
    pub url: String,

    /// Basic-auth user (default: `jsonrpc`).
    #[serde(default = "default_source_user")]
    pub user: String,

    /// Basic-auth token.
    #[serde(default)]
    pub token: String,

    /// Kanboard project to migrate.
    #[serde(default, deserialize_with = "de_scalar")]
    pub project_id: String,

    /// Columns whose tasks are not migrated (e.g. "Done", "Closed").
    #[serde(default, deserialize_with = "de_scalar_list")]
    pub excluded_columns: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            user: default_source_user(),
            token: String::new(),
            project_id: String::new(),
            excluded_columns: Vec::new(),
        }
    }
}

impl SourceConfig {
    pub fn excluded_set(&self) -> HashSet<String> {
        self.excluded_columns
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }
}

fn default_source_user() -> String {
    DEFAULT_SOURCE_USER.to_string()
}

/// Phabricator connection and target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Conduit API base, e.g. `https://phabricator.example.org/api`.
    #[serde(default)]
    pub url: String,

    /// Conduit API token.
    #[serde(default)]
    pub api_token: String,

    /// Project every migrated task is tagged with.
    #[serde(default)]
    pub project_phid: String,

    /// User unsubscribed from every task in the project once the migration is done.
    /// Normally the owner of `api_token`.
    #[serde(default)]
    pub watcher_phid: String,
}

/// What to do with a staged task whose title has no Maniphest match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Abort the run (default).
    #[default]
    Fail,
    /// Warn, record the title in the report and continue.
    Skip,
}

/// Migration behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationConfig {
    #[serde(default)]
    pub unmatched: UnmatchedPolicy,

    /// Per-request timeout in seconds. Unset means wait indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl MigrationConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration from a single YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Check that everything needed to talk to Kanboard is present.
    pub fn validate_source(&self) -> MigrateResult<()> {
        require("source.url", &self.source.url)?;
        require("source.user", &self.source.user)?;
        require("source.token", &self.source.token)?;
        require("source.project_id", &self.source.project_id)?;
        Ok(())
    }

    /// Check the whole configuration before a full run.
    pub fn validate(&self) -> MigrateResult<()> {
        self.validate_source()?;
        require("destination.url", &self.destination.url)?;
        require("destination.api_token", &self.destination.api_token)?;
        require("destination.project_phid", &self.destination.project_phid)?;
        require("destination.watcher_phid", &self.destination.watcher_phid)?;
        Ok(())
    }
}

// Ids may be written unquoted in YAML.

fn scalar_to_string(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn de_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    match value {
        serde_yaml::Value::Null => Ok(String::new()),
        other => scalar_to_string(other)
            .ok_or_else(|| serde::de::Error::custom("expected a string or number")),
    }
}

fn de_scalar_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<serde_yaml::Value>>::deserialize(deserializer)?;
    values
        .unwrap_or_default()
        .into_iter()
        .map(|v| {
            scalar_to_string(v)
                .ok_or_else(|| serde::de::Error::custom("expected a list of strings or numbers"))
        })
        .collect()
}

fn require(key: &str, value: &str) -> MigrateResult<()> {
    if value.trim().is_empty() {
        Err(MigrateError::missing_setting(key))
    } else {
        Ok(())
    }
}
