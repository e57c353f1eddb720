//! Read phase: pull everything needed from Kanboard into memory.
//!
//! Every Kanboard call happens here, before any write to Phabricator, so a connection
//! problem half way through publishing never leaves the source side unread.

use crate::error::{ErrorCode, MigrateResult};
use crate::source::{JsonRpcTransport, KanboardClient, STATUS_ACTIVE};
use crate::types::{SourceTask, StagedTask};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Stage every active task of `project_id` whose column is not excluded.
///
/// Failing to list tasks or comments, or failing to reach Kanboard at all, aborts the
/// whole collection. An owner that Kanboard does not know or refuses to return does not;
/// the task is staged without an assignee.
pub async fn collect<T: JsonRpcTransport>(
    source: &KanboardClient<T>,
    project_id: &str,
    excluded_columns: &HashSet<String>,
) -> MigrateResult<Vec<StagedTask>> {
    let tasks = source.get_all_tasks(project_id, STATUS_ACTIVE).await?;
    let total = tasks.len();

    let retained = filter_excluded(tasks, excluded_columns);
    info!(
        project = project_id,
        total,
        retained = retained.len(),
        "Fetched Kanboard tasks"
    );

    let mut staged = Vec::with_capacity(retained.len());
    for task in retained {
        let comments = source.get_all_comments(&task.id).await?;
        let assignee = resolve_assignee(source, &task).await?;
        debug!(
            task_id = %task.id,
            comments = comments.len(),
            assignee = assignee.as_deref().unwrap_or("-"),
            "Staged task"
        );
        staged.push(StagedTask::new(task, comments, assignee));
    }

    Ok(staged)
}

/// Drop tasks sitting in an excluded column. Order is preserved.
pub fn filter_excluded(tasks: Vec<SourceTask>, excluded_columns: &HashSet<String>) -> Vec<SourceTask> {
    tasks
        .into_iter()
        .filter(|t| !excluded_columns.contains(t.column_id.trim()))
        .collect()
}

/// Username of the task owner. Transport failures propagate; RPC or decode errors do not.
async fn resolve_assignee<T: JsonRpcTransport>(
    source: &KanboardClient<T>,
    task: &SourceTask,
) -> MigrateResult<Option<String>> {
    let Some(owner) = task.owner() else {
        return Ok(None);
    };
    match source.get_user(owner).await {
        Ok(Some(user)) => Ok(Some(user.username)),
        Ok(None) => {
            warn!(task_id = %task.id, owner, "Owner not found, staging without assignee");
            Ok(None)
        }
        Err(e) if e.code == ErrorCode::Transport => Err(e),
        Err(e) => {
            warn!(task_id = %task.id, owner, error = %e, "Owner lookup failed, staging without assignee");
            Ok(None)
        }
    }
}
