//! Structured error types for the migration.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Setup errors
    Configuration,

    // Remote errors (always fatal)
    Transport,
    Rpc,
    MalformedResponse,

    // Lookup errors
    TitleNotFound,
}

/// Structured migration error.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct MigrateError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl MigrateError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Configuration, message)
    }

    pub fn missing_setting(key: &str) -> Self {
        Self::new(
            ErrorCode::Configuration,
            format!("{} must be set and non-empty", key),
        )
    }

    pub fn transport(system: &str, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::Transport,
            format!("{} request failed: {}", system, err),
        )
    }

    pub fn rpc(system: &str, method: &str, message: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::Rpc,
            format!("{} call {} returned an error: {}", system, method, message),
        )
    }

    pub fn malformed(method: &str, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::MalformedResponse,
            format!("Malformed response from {}: {}", method, err),
        )
    }

    pub fn title_not_found(title: &str) -> Self {
        Self::new(
            ErrorCode::TitleNotFound,
            format!("No destination task titled {:?}", title),
        )
    }
}

/// Result type for migration operations.
pub type MigrateResult<T> = std::result::Result<T, MigrateError>;
