//! Output formatting for replayed comments and staged-task plans.

use crate::types::StagedTask;
use chrono::{DateTime, Utc};

/// Attribution used when Kanboard did not report a comment author.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Output format for the staged plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
}

/// Render epoch seconds as `YYYY-MM-DD HH:MM:SS UTC`.
///
/// Out-of-range values fall back to the raw number so a bad record never aborts a replay.
pub fn format_timestamp(epoch_secs: i64) -> String {
    match DateTime::<Utc>::from_timestamp(epoch_secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("@{} UTC", epoch_secs),
    }
}

/// Body of a comment replayed on Maniphest, with an attribution header.
pub fn format_comment_body(username: Option<&str>, comment: &str, date: i64) -> String {
    format!(
        "Originally made by {} at {}\n\n{}",
        username.unwrap_or(UNKNOWN_AUTHOR),
        format_timestamp(date),
        comment
    )
}

/// Format staged tasks as markdown.
pub fn format_staged_markdown(staged: &[StagedTask]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Staged tasks ({})\n", staged.len()));

    for entry in staged {
        let task = entry.task();
        md.push_str(&format!("\n## {}\n", task.title));
        md.push_str(&format!("- **id**: `{}`\n", task.id));
        md.push_str(&format!("- **column**: {}\n", task.column_id));
        if let Some(assignee) = entry.assignee() {
            md.push_str(&format!("- **assignee**: {}\n", assignee));
        }
        md.push_str(&format!("- **comments**: {}\n", entry.comments().len()));

        for comment in entry.comments() {
            md.push_str(&format!(
                "  - {} by {}\n",
                format_timestamp(comment.date),
                comment.username.as_deref().unwrap_or(UNKNOWN_AUTHOR)
            ));
        }
    }

    md
}

/// Format staged tasks as pretty JSON.
pub fn format_staged_json(staged: &[StagedTask]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(staged)
}
