//! Task model: one scheduled post unit.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identifier of a task row in the store.
///
/// ULID-backed: sortable by creation time, generatable without coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Ulid);

impl TaskId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Ulid> for TaskId {
    fn from(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Task state (post lifecycle).
///
/// State transitions:
/// - Pending -> Posted (successful publish)
/// - Pending -> Retrying -> Retrying (failed attempt below max_attempts)
/// - Pending/Retrying -> Failed (max_attempts reached, non-retryable failure,
///   or missed-window detection)
/// - Failed -> Pending (operator reset/reschedule only, never automatic)
///
/// A store row that has never been touched carries no marker; it deserializes
/// to `Pending`, which the engine treats the same way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Retrying,
    Posted,
    Failed,
}

impl TaskStatus {
    /// Is this a terminal state (no further automatic transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Posted)
    }

    /// Does this task need operator remediation (reset, reschedule, retry)?
    pub fn requires_remediation(self) -> bool {
        matches!(self, TaskStatus::Failed | TaskStatus::Retrying)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Retrying => "retrying",
            TaskStatus::Posted => "posted",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One scheduled post unit.
///
/// Rows are never deleted: the store doubles as an audit log of everything
/// that has been posted plus the live pending/failed entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    /// When to post. Mutated only by the bulk rescheduler. `None` models a
    /// malformed row; such rows are skipped everywhere.
    pub scheduled_at: Option<DateTime<Utc>>,

    /// Text payload to publish. Immutable after creation.
    pub content: String,

    #[serde(default)]
    pub status: TaskStatus,

    /// Last failure diagnostic. Cleared on success or explicit reset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Attempts consumed so far. Monotonically non-decreasing until an
    /// explicit operator reset.
    #[serde(default)]
    pub retry_count: u32,
}

impl Task {
    pub fn new(scheduled_at: DateTime<Utc>, content: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            scheduled_at: Some(scheduled_at),
            content: content.into(),
            status: TaskStatus::Pending,
            error_message: None,
            retry_count: 0,
        }
    }

    /// A row is well-formed when it has both a scheduled instant and content.
    pub fn is_well_formed(&self) -> bool {
        self.scheduled_at.is_some() && !self.content.trim().is_empty()
    }

    /// Due for an attempt: the window has opened and the task is not posted.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.scheduled_at {
            Some(at) => self.is_well_formed() && at <= now && self.status != TaskStatus::Posted,
            None => false,
        }
    }

    /// Silently missed: the window has passed and no attempt was ever made.
    pub fn is_missed(&self, now: DateTime<Utc>) -> bool {
        match self.scheduled_at {
            Some(at) => self.is_well_formed() && at < now && self.status == TaskStatus::Pending,
            None => false,
        }
    }
}
