//! Core types for the Kanboard to Maniphest migration.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A task as returned by Kanboard's `getAllTasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTask {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_text")]
    pub title: String,
    #[serde(default, deserialize_with = "de_text")]
    pub description: String,
    #[serde(default, deserialize_with = "de_text")]
    pub column_id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub owner_id: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub project_id: String,
}

impl SourceTask {
    /// The owner id, if the task is assigned.
    ///
    /// Kanboard reports unassigned tasks with owner `0`, an empty string or no field at all.
    pub fn owner(&self) -> Option<&str> {
        self.owner_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != "0")
    }
}

/// A comment as returned by Kanboard's `getAllComments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceComment {
    #[serde(default, deserialize_with = "de_text")]
    pub task_id: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub comment: String,
    /// Creation time in epoch seconds.
    #[serde(deserialize_with = "de_epoch")]
    pub date: i64,
}

/// A user record as returned by Kanboard's `getUser`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUser {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_text")]
    pub username: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub name: Option<String>,
}

/// Source data for one task, fully read before anything is written to the destination.
///
/// Comments are kept in ascending `date` order; ties keep the order Kanboard returned them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedTask {
    task: SourceTask,
    comments: Vec<SourceComment>,
    assignee: Option<String>,
}

impl StagedTask {
    pub fn new(task: SourceTask, mut comments: Vec<SourceComment>, assignee: Option<String>) -> Self {
        // sort_by_key is stable
        comments.sort_by_key(|c| c.date);
        Self {
            task,
            comments,
            assignee,
        }
    }

    pub fn task(&self) -> &SourceTask {
        &self.task
    }

    pub fn title(&self) -> &str {
        &self.task.title
    }

    pub fn comments(&self) -> &[SourceComment] {
        &self.comments
    }

    pub fn assignee(&self) -> Option<&str> {
        self.assignee.as_deref()
    }
}

/// A Maniphest task as returned by `maniphest.query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationTask {
    pub phid: String,
    #[serde(default, deserialize_with = "de_text")]
    pub title: String,
    #[serde(default, deserialize_with = "de_text")]
    pub description: String,
    #[serde(rename = "projectPHIDs", default)]
    pub project_phids: Vec<String>,
    #[serde(rename = "ccPHIDs", default)]
    pub subscriber_phids: Vec<String>,
}

/// A single edit applied to a Maniphest task through `maniphest.edit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    /// Append a comment.
    Comment(String),
    /// Remove users from the subscriber list.
    RemoveSubscribers(Vec<String>),
}

impl Transaction {
    /// Conduit transaction type.
    pub fn kind(&self) -> &'static str {
        match self {
            Transaction::Comment(_) => "comment",
            Transaction::RemoveSubscribers(_) => "subscribers.remove",
        }
    }
}

// Kanboard is inconsistent about quoting numbers, depending on version and backend.

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_text(value).ok_or_else(|| serde::de::Error::custom("id must not be null"))
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(value))
}

fn de_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(value).unwrap_or_default())
}

fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Ok(value_to_text(other)),
    }
}

fn de_epoch<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid timestamp: {:?}", s))),
        other => Err(serde::de::Error::custom(format!(
            "invalid timestamp: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comment(date: i64, body: &str) -> SourceComment {
        SourceComment {
            task_id: "1".to_string(),
            username: None,
            comment: body.to_string(),
            date,
        }
    }

    fn task_with_owner(owner: Option<&str>) -> SourceTask {
        SourceTask {
            id: "1".to_string(),
            title: "t".to_string(),
            description: String::new(),
            column_id: "2".to_string(),
            owner_id: owner.map(String::from),
            project_id: "45".to_string(),
        }
    }

    #[test]
    fn test_source_task_accepts_numbers_and_strings() {
        let task: SourceTask = serde_json::from_value(json!({
            "id": 12,
            "title": "Fix login",
            "description": null,
            "column_id": "184",
            "owner_id": 0,
            "project_id": "45",
            "color_id": "yellow"
        }))
        .unwrap();

        assert_eq!(task.id, "12");
        assert_eq!(task.description, "");
        assert_eq!(task.column_id, "184");
        assert_eq!(task.owner_id.as_deref(), Some("0"));
        assert_eq!(task.owner(), None);
    }

    #[test]
    fn test_owner_detection() {
        assert_eq!(task_with_owner(None).owner(), None);
        assert_eq!(task_with_owner(Some("")).owner(), None);
        assert_eq!(task_with_owner(Some("0")).owner(), None);
        assert_eq!(task_with_owner(Some("42")).owner(), Some("42"));
    }

    #[test]
    fn test_comment_date_from_string() {
        let parsed: SourceComment = serde_json::from_value(json!({
            "task_id": "3",
            "comment": "hello",
            "date": "1609459200"
        }))
        .unwrap();
        assert_eq!(parsed.date, 1_609_459_200);
        assert_eq!(parsed.username, None);
    }

    #[test]
    fn test_comment_rejects_garbage_date() {
        let parsed = serde_json::from_value::<SourceComment>(json!({
            "comment": "hello",
            "date": "yesterday"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_staged_task_sorts_comments_by_date() {
        let staged = StagedTask::new(
            task_with_owner(None),
            vec![comment(50, "c"), comment(10, "a"), comment(30, "b")],
            None,
        );
        let dates: Vec<i64> = staged.comments().iter().map(|c| c.date).collect();
        assert_eq!(dates, vec![10, 30, 50]);
    }

    #[test]
    fn test_staged_task_sort_is_stable() {
        let staged = StagedTask::new(
            task_with_owner(None),
            vec![comment(20, "first"), comment(10, "zero"), comment(20, "second")],
            None,
        );
        let bodies: Vec<&str> = staged.comments().iter().map(|c| c.comment.as_str()).collect();
        assert_eq!(bodies, vec!["zero", "first", "second"]);
    }

    #[test]
    fn test_destination_task_fields() {
        let task: DestinationTask = serde_json::from_value(json!({
            "id": "7",
            "phid": "PHID-TASK-abc",
            "title": "Bug A",
            "projectPHIDs": ["PHID-PROJ-1"],
            "ccPHIDs": ["PHID-USER-1"]
        }))
        .unwrap();
        assert_eq!(task.phid, "PHID-TASK-abc");
        assert_eq!(task.project_phids, vec!["PHID-PROJ-1"]);
        assert_eq!(task.subscriber_phids, vec!["PHID-USER-1"]);
        assert_eq!(task.description, "");
    }

    #[test]
    fn test_transaction_kinds() {
        assert_eq!(Transaction::Comment("x".into()).kind(), "comment");
        assert_eq!(
            Transaction::RemoveSubscribers(vec![]).kind(),
            "subscribers.remove"
        );
    }
}
