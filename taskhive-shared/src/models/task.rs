/// Task subdocuments: tasks, comments and subtask buckets
///
/// Tasks have no table of their own; they live inside the owning project's
/// `tasks` JSONB array and are persisted through the project model's array
/// primitives. A task's `key` is a sequential "T<n>" value assigned by the
/// server (see the `keys` module) and kept contiguous across deletions.
///
/// # Example
///
/// ```
/// use taskhive_shared::models::task::{PersonSnapshot, Task, TaskStatus};
/// use uuid::Uuid;
///
/// let reporter = PersonSnapshot {
///     user_id: Uuid::new_v4(),
///     name: "Grace Hopper".to_string(),
/// };
///
/// let task = Task::new(
///     "T1".to_string(),
///     "Fix login flow".to_string(),
///     None,
///     "Bug".to_string(),
///     vec![reporter.clone()],
///     reporter,
///     TaskStatus::InDevelopment,
///     None,
/// );
///
/// assert_eq!(task.resolution.as_str(), "Un-Resolved");
/// assert!(task.latest_comment_at().is_none());
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::keys::Keyed;

/// Denormalized (user id, display name) pair
///
/// Used for task assignees, reporters and comment authors. The name is a
/// copy taken at creation time and is not updated if the user renames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSnapshot {
    /// ID of the referenced user
    pub user_id: Uuid,

    /// Display name ("First Last") at snapshot time
    pub name: String,
}

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "In Development")]
    InDevelopment,

    #[serde(rename = "Testing")]
    Testing,

    #[serde(rename = "In Review")]
    InReview,

    #[serde(rename = "Ready to Merge")]
    ReadyToMerge,

    #[serde(rename = "Resolved")]
    Resolved,
}

impl TaskStatus {
    /// Status as its display string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::InDevelopment => "In Development",
            TaskStatus::Testing => "Testing",
            TaskStatus::InReview => "In Review",
            TaskStatus::ReadyToMerge => "Ready to Merge",
            TaskStatus::Resolved => "Resolved",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In Development" => Ok(TaskStatus::InDevelopment),
            "Testing" => Ok(TaskStatus::Testing),
            "In Review" => Ok(TaskStatus::InReview),
            "Ready to Merge" => Ok(TaskStatus::ReadyToMerge),
            "Resolved" => Ok(TaskStatus::Resolved),
            _ => Err(()),
        }
    }
}

/// Resolution, derived from status and never set directly
///
/// "Resolved" iff the status is `Resolved`, "Un-Resolved" for every other
/// status. Recomputed server-side on every status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "Resolved")]
    Resolved,

    #[serde(rename = "Un-Resolved")]
    UnResolved,
}

impl Resolution {
    /// Resolution as its display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Resolved => "Resolved",
            Resolution::UnResolved => "Un-Resolved",
        }
    }
}

impl From<TaskStatus> for Resolution {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Resolved => Resolution::Resolved,
            _ => Resolution::UnResolved,
        }
    }
}

/// A comment on a task
///
/// Comments are append-only from the client's perspective, but edit/delete
/// are expressed as a full-list replace of the task's comment array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Author snapshot at posting time
    pub author: PersonSnapshot,

    /// Comment body
    pub content: String,

    /// Users tagged in the comment
    #[serde(default)]
    pub tagged_users: Vec<Uuid>,

    /// When the comment was posted
    pub date_added: DateTime<Utc>,
}

/// The three subtask buckets of a task
///
/// Each bucket is an ordered list of free-text entries; moving a subtask
/// between buckets is a whole-structure replace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subtasks {
    #[serde(default)]
    pub to_do: Vec<String>,

    #[serde(default)]
    pub in_progress: Vec<String>,

    #[serde(default)]
    pub complete: Vec<String>,
}

/// A task inside a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Stable task ID (server-assigned)
    pub id: Uuid,

    /// Sequential human-readable key, e.g. "T3" (server-assigned)
    pub key: String,

    /// Task title
    pub title: String,

    /// Optional longer description
    #[serde(default)]
    pub description: Option<String>,

    /// Task type, e.g. "Bug" or "Feature"
    #[serde(rename = "type")]
    pub kind: String,

    /// Assignee snapshots; every assignee is a project member at assign time
    pub assignees: Vec<PersonSnapshot>,

    /// Reporter snapshot (the member who created the task)
    pub reporter: PersonSnapshot,

    /// Workflow status
    pub status: TaskStatus,

    /// Derived from `status`
    pub resolution: Resolution,

    /// When the task was created
    pub date_created: DateTime<Utc>,

    /// When the task was last updated
    #[serde(default)]
    pub date_updated: Option<DateTime<Utc>>,

    /// Optional due date
    #[serde(default)]
    pub date_due: Option<DateTime<Utc>>,

    /// Ordered comment list
    #[serde(default)]
    pub comments: Vec<Comment>,

    /// Subtask buckets
    #[serde(default)]
    pub subtasks: Subtasks,
}

impl Task {
    /// Builds a new task with a fresh ID, derived resolution, empty comments
    /// and empty subtask buckets
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        key: String,
        title: String,
        description: Option<String>,
        kind: String,
        assignees: Vec<PersonSnapshot>,
        reporter: PersonSnapshot,
        status: TaskStatus,
        date_due: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            title,
            description,
            kind,
            assignees,
            reporter,
            status,
            resolution: Resolution::from(status),
            date_created: Utc::now(),
            date_updated: None,
            date_due,
            comments: Vec::new(),
            subtasks: Subtasks::default(),
        }
    }

    /// Sets the status and recomputes the derived resolution
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.resolution = Resolution::from(status);
    }

    /// Whether the given user is an assignee of this task
    pub fn is_assigned_to(&self, user_id: Uuid) -> bool {
        self.assignees.iter().any(|a| a.user_id == user_id)
    }

    /// Date of the most recent comment, if any
    ///
    /// Comments are stored in posting order, so the last entry is the latest.
    pub fn latest_comment_at(&self) -> Option<DateTime<Utc>> {
        self.comments.last().map(|c| c.date_added)
    }
}

impl Keyed for Task {
    const PREFIX: &'static str = "T";

    fn key(&self) -> &str {
        &self.key
    }

    fn set_key(&mut self, key: String) {
        self.key = key;
    }
}
