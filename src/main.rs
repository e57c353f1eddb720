//! kanboard-migrate
//!
//! One-shot migration of a Kanboard project into a Phabricator Maniphest project.

use anyhow::{Context, Result};
use clap::Parser;
use kanboard_migrate::cli::plan::PlanArgs;
use kanboard_migrate::cli::{Cli, Command};
use kanboard_migrate::config::{Config, ConfigLoader};
use kanboard_migrate::destination::ManiphestClient;
use kanboard_migrate::format::{OutputFormat, format_staged_json, format_staged_markdown};
use kanboard_migrate::logging::{self, LogTarget};
use kanboard_migrate::pipeline::{run_collect_only, run_migration};
use kanboard_migrate::source::KanboardClient;
use std::path::Path;
use tracing::{debug, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut loader = match &cli.config {
        Some(path) => ConfigLoader::load_file(Path::new(path))?,
        None => ConfigLoader::load()?,
    };
    for (tier, path) in loader.sources() {
        debug!(tier = %tier, path = %path.display(), "Config source");
    }
    cli.apply_overrides(loader.config_mut());
    let config = loader.into_config();

    match cli.command {
        Some(Command::Plan(args)) => run_plan(&config, args).await?,
        Some(Command::Run) | None => run_full(&config).await?,
    }

    Ok(())
}

/// Collect only and print the staged tasks
async fn run_plan(config: &Config, args: PlanArgs) -> Result<()> {
    let timeout = config.migration.request_timeout();
    let source = KanboardClient::from_config(&config.source, timeout)?;

    let staged = run_collect_only(config, &source).await?;

    let rendered = match OutputFormat::from(args.format) {
        OutputFormat::Json => format_staged_json(&staged)?,
        OutputFormat::Markdown => format_staged_markdown(&staged),
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &rendered)
            .with_context(|| format!("failed to write plan to {}", path.display()))?;
        eprintln!("Wrote plan for {} tasks to {}", staged.len(), path.display());
    } else {
        print!("{}", rendered);
    }

    Ok(())
}

/// Run the full migration
async fn run_full(config: &Config) -> Result<()> {
    let timeout = config.migration.request_timeout();
    let source = KanboardClient::from_config(&config.source, timeout)?;
    let dest = ManiphestClient::from_config(&config.destination, timeout)?;

    info!(
        source = %config.source.url,
        destination = %config.destination.url,
        "Starting migration"
    );
    let report = run_migration(config, &source, &dest).await?;

    println!("Migration complete: {}", report);
    Ok(())
}
