//! CLI command definitions for kanboard-migrate
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod plan;

use crate::config::Config;
use clap::{Parser, Subcommand};
use plan::PlanArgs;

/// Migrate Kanboard tasks and comments into Phabricator Maniphest
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (replaces project and user config files)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Kanboard project id (overrides config)
    #[arg(long, global = true)]
    pub source_project: Option<String>,

    /// Maniphest project PHID (overrides config)
    #[arg(long, global = true)]
    pub dest_project: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(project) = &self.source_project {
            config.source.project_id = project.clone();
        }
        if let Some(project) = &self.dest_project {
            config.destination.project_phid = project.clone();
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full migration (default if no subcommand given)
    Run,

    /// Read from Kanboard only and print the staged tasks
    Plan(PlanArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::plan::PlanFormat;

    #[test]
    fn test_defaults_to_run() {
        let cli = Cli::try_parse_from(["kanboard-migrate"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_plan_with_global_flags() {
        let cli = Cli::try_parse_from([
            "kanboard-migrate",
            "plan",
            "--format",
            "json",
            "--source-project",
            "87",
            "-v",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Plan(ref args)) => assert_eq!(args.format, PlanFormat::Json),
            ref other => panic!("expected plan, got {:?}", other),
        }
        assert!(cli.verbose);

        let mut config = Config::default();
        config.source.project_id = "45".to_string();
        cli.apply_overrides(&mut config);
        assert_eq!(config.source.project_id, "87");
        assert!(config.destination.project_phid.is_empty());
    }
}
