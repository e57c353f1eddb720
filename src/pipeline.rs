//! Top-level sequencing: collect everything, then publish everything.

use crate::collector::collect;
use crate::config::Config;
use crate::destination::{ConduitTransport, ManiphestClient};
use crate::error::MigrateResult;
use crate::publisher::{PublishOptions, PublishReport, publish};
use crate::source::{JsonRpcTransport, KanboardClient};
use crate::types::StagedTask;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Outcome of a full migration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub staged: usize,
    #[serde(flatten)]
    pub published: PublishReport,
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "staged {} tasks, created {}, replayed {} comments, unsubscribed from {}",
            self.staged,
            self.published.created,
            self.published.comments_replayed,
            self.published.unsubscribed
        )?;
        if !self.published.unmatched.is_empty() {
            write!(
                f,
                ", {} unmatched: {}",
                self.published.unmatched.len(),
                self.published.unmatched.join(", ")
            )?;
        }
        Ok(())
    }
}

impl From<&Config> for PublishOptions {
    fn from(config: &Config) -> Self {
        Self {
            project_phid: config.destination.project_phid.clone(),
            watcher_phid: config.destination.watcher_phid.clone(),
            unmatched: config.migration.unmatched,
        }
    }
}

/// Read phase only. Nothing is written anywhere.
pub async fn run_collect_only<S: JsonRpcTransport>(
    config: &Config,
    source: &KanboardClient<S>,
) -> MigrateResult<Vec<StagedTask>> {
    config.validate_source()?;
    collect(source, &config.source.project_id, &config.source.excluded_set()).await
}

/// Full migration. The destination is not touched until collection has finished.
pub async fn run_migration<S: JsonRpcTransport, D: ConduitTransport>(
    config: &Config,
    source: &KanboardClient<S>,
    dest: &ManiphestClient<D>,
) -> MigrateResult<MigrationReport> {
    config.validate()?;

    info!(project = %config.source.project_id, "Collecting from Kanboard");
    let staged = collect(source, &config.source.project_id, &config.source.excluded_set()).await?;

    info!(
        project = %config.destination.project_phid,
        tasks = staged.len(),
        "Publishing to Maniphest"
    );
    let published = publish(dest, &staged, &PublishOptions::from(config)).await?;

    let report = MigrationReport {
        staged: staged.len(),
        published,
    };
    info!(%report, "Migration finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display() {
        let mut report = MigrationReport {
            staged: 3,
            published: PublishReport {
                created: 3,
                comments_replayed: 7,
                unsubscribed: 4,
                unmatched: vec![],
            },
        };
        assert_eq!(
            report.to_string(),
            "staged 3 tasks, created 3, replayed 7 comments, unsubscribed from 4"
        );

        report.published.unmatched = vec!["A".to_string(), "B".to_string()];
        assert!(report.to_string().ends_with(", 2 unmatched: A, B"));
    }

    #[test]
    fn test_report_serializes_flat() {
        let json = serde_json::to_value(MigrationReport::default()).unwrap();
        assert_eq!(json["staged"], 0);
        assert_eq!(json["comments_replayed"], 0);
    }
}
