//! Task store port: the persisted task list.
//!
//! Rows are addressed by task identity with named-field patches; the engine
//! never sees column positions, header rows, or any other storage detail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{StoreError, Task, TaskId, TaskStatus};

/// Partial update of one task row. Unset fields are left alone.
///
/// `error_message` distinguishes "leave it" (`None`) from "clear it"
/// (`Some(None)`), so a successful publish can wipe an old diagnostic.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub error_message: Option<Option<String>>,
    pub retry_count: Option<u32>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(Some(message.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.error_message = Some(None);
        self
    }

    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = Some(count);
        self
    }

    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    /// Fold the patch into a task. Shared by store implementations.
    pub fn apply(&self, task: &mut Task) {
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(error_message) = &self.error_message {
            task.error_message = error_message.clone();
        }
        if let Some(retry_count) = self.retry_count {
            task.retry_count = retry_count;
        }
        if let Some(scheduled_at) = self.scheduled_at {
            task.scheduled_at = Some(scheduled_at);
        }
    }
}

/// Store port. Implementations keep rows in insertion order and never delete:
/// the list is an audit log plus the live entries.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All data rows, in store order.
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;

    /// Patch one row addressed by id.
    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<(), StoreError>;

    /// Append a new row at the end.
    async fn append_task(&self, task: Task) -> Result<(), StoreError>;
}
