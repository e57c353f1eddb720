//! Plan subcommand
//!
//! Runs only the Kanboard read phase and prints what would be migrated.

use crate::format::OutputFormat;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Output format for the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PlanFormat {
    /// Human-readable summary (default)
    #[default]
    Markdown,
    /// Full staged records as JSON
    Json,
}

impl From<PlanFormat> for OutputFormat {
    fn from(format: PlanFormat) -> Self {
        match format {
            PlanFormat::Markdown => OutputFormat::Markdown,
            PlanFormat::Json => OutputFormat::Json,
        }
    }
}

/// Arguments for the plan subcommand
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = PlanFormat::Markdown)]
    pub format: PlanFormat,

    /// Write the plan to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}
