//! Write phase: push staged tasks into Maniphest.
//!
//! Three strictly ordered steps: create every task, re-query the project to find the
//! created tasks by title, then replay comments and unsubscribe the watcher.

use crate::config::UnmatchedPolicy;
use crate::destination::{ConduitTransport, ManiphestClient};
use crate::error::{MigrateError, MigrateResult};
use crate::format::format_comment_body;
use crate::types::{DestinationTask, StagedTask, Transaction};
use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, info, warn};

/// Where and how to publish.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub project_phid: String,
    pub watcher_phid: String,
    pub unmatched: UnmatchedPolicy,
}

/// Counts of what was written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub created: usize,
    pub comments_replayed: usize,
    pub unsubscribed: usize,
    /// Titles of staged tasks with no Maniphest match (only under `UnmatchedPolicy::Skip`).
    pub unmatched: Vec<String>,
}

/// Maniphest tasks of one project, looked up by exact title.
#[derive(Debug, Clone, Default)]
pub struct DestinationIndex {
    tasks: Vec<DestinationTask>,
    by_title: HashMap<String, usize>,
}

impl DestinationIndex {
    /// Build the index. When titles collide the first task in `tasks` wins.
    pub fn from_tasks(tasks: Vec<DestinationTask>) -> Self {
        let mut by_title = HashMap::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            match by_title.entry(task.title.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
                Entry::Occupied(existing) => {
                    warn!(
                        title = %task.title,
                        kept = %tasks[*existing.get()].phid,
                        ignored = %task.phid,
                        "Duplicate Maniphest title"
                    );
                }
            }
        }
        Self { tasks, by_title }
    }

    /// PHID of the task titled exactly `title`.
    pub fn lookup(&self, title: &str) -> Option<&str> {
        self.by_title
            .get(title)
            .map(|&i| self.tasks[i].phid.as_str())
    }

    /// Every task PHID in the project, including duplicate titles, in query order.
    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.phid.as_str())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Create one Maniphest task per staged task, tagged with `project_phid`.
///
/// The returned PHIDs are not kept. Tasks are found again by title in
/// [`index_destination_tasks`], which also picks up tasks left by an earlier run.
pub async fn create_all<T: ConduitTransport>(
    dest: &ManiphestClient<T>,
    staged: &[StagedTask],
    project_phid: &str,
) -> MigrateResult<usize> {
    let projects = [project_phid.to_string()];
    for entry in staged {
        let task = entry.task();
        let phid = dest
            .create_task(&task.title, &task.description, &projects)
            .await?;
        debug!(source_id = %task.id, phid = %phid, "Created Maniphest task");
    }
    info!(created = staged.len(), "Created Maniphest tasks");
    Ok(staged.len())
}

/// Query every task of the project and index it by title.
pub async fn index_destination_tasks<T: ConduitTransport>(
    dest: &ManiphestClient<T>,
    project_phid: &str,
) -> MigrateResult<DestinationIndex> {
    let tasks = dest.query_tasks(&[project_phid.to_string()]).await?;
    let index = DestinationIndex::from_tasks(tasks);
    info!(tasks = index.len(), "Indexed Maniphest project");
    Ok(index)
}

/// Replay each staged task's comments, oldest first, onto its Maniphest match.
///
/// Returns the number of comments written and the titles that had no match.
pub async fn replay_comments<T: ConduitTransport>(
    dest: &ManiphestClient<T>,
    staged: &[StagedTask],
    index: &DestinationIndex,
    policy: UnmatchedPolicy,
) -> MigrateResult<(usize, Vec<String>)> {
    let mut replayed = 0;
    let mut unmatched = Vec::new();

    for entry in staged {
        let Some(phid) = index.lookup(entry.title()) else {
            match policy {
                UnmatchedPolicy::Fail => return Err(MigrateError::title_not_found(entry.title())),
                UnmatchedPolicy::Skip => {
                    warn!(title = entry.title(), "No Maniphest match, comments not replayed");
                    unmatched.push(entry.title().to_string());
                    continue;
                }
            }
        };

        for comment in entry.comments() {
            let body = format_comment_body(comment.username.as_deref(), &comment.comment, comment.date);
            dest.edit(phid, &[Transaction::Comment(body)]).await?;
            replayed += 1;
        }
        debug!(phid, comments = entry.comments().len(), "Replayed comments");
    }

    info!(replayed, unmatched = unmatched.len(), "Replayed comments");
    Ok((replayed, unmatched))
}

/// Remove `watcher_phid` from the subscribers of every task in the index.
pub async fn unsubscribe_all<T: ConduitTransport>(
    dest: &ManiphestClient<T>,
    index: &DestinationIndex,
    watcher_phid: &str,
) -> MigrateResult<usize> {
    let watcher = vec![watcher_phid.to_string()];
    let mut count = 0;
    for phid in index.handles() {
        dest.edit(phid, &[Transaction::RemoveSubscribers(watcher.clone())])
            .await?;
        count += 1;
    }
    info!(tasks = count, watcher = watcher_phid, "Unsubscribed watcher");
    Ok(count)
}

/// Run create, index, replay and unsubscribe in order.
pub async fn publish<T: ConduitTransport>(
    dest: &ManiphestClient<T>,
    staged: &[StagedTask],
    options: &PublishOptions,
) -> MigrateResult<PublishReport> {
    let created = create_all(dest, staged, &options.project_phid).await?;
    let index = index_destination_tasks(dest, &options.project_phid).await?;
    let (comments_replayed, unmatched) =
        replay_comments(dest, staged, &index, options.unmatched).await?;
    let unsubscribed = unsubscribe_all(dest, &index, &options.watcher_phid).await?;

    Ok(PublishReport {
        created,
        comments_replayed,
        unsubscribed,
        unmatched,
    })
}
