//! Kanboard to Phabricator Maniphest migration library.
//!
//! This module exports the core components for testing and integration.

pub mod cli;
pub mod collector;
pub mod config;
pub mod destination;
pub mod error;
pub mod format;
pub mod logging;
pub mod pipeline;
pub mod publisher;
pub mod source;
pub mod types;
