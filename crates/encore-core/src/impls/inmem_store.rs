//! In-memory task store for development and tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{StoreError, Task, TaskId};
use crate::ports::{TaskPatch, TaskStore};

/// Vec-backed store. Insertion order is store order; rows are only ever
/// patched or appended, never removed.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
        }
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.lock().await.clone())
    }

    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        patch.apply(task);
        Ok(())
    }

    async fn append_task(&self, task: Task) -> Result<(), StoreError> {
        self.tasks.lock().await.push(task);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::TaskStatus;

    #[tokio::test]
    async fn preserves_insertion_order() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let store = InMemoryTaskStore::new();
        store.append_task(Task::new(at, "a")).await.unwrap();
        store.append_task(Task::new(at, "b")).await.unwrap();
        store.append_task(Task::new(at, "c")).await.unwrap();

        let contents: Vec<String> = store
            .list_tasks()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(contents, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn update_patches_the_addressed_row_only() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let first = Task::new(at, "a");
        let second = Task::new(at, "b");
        let second_id = second.id;
        let store = InMemoryTaskStore::with_tasks(vec![first, second]);

        store
            .update_task(second_id, TaskPatch::new().status(TaskStatus::Posted))
            .await
            .unwrap();

        let tasks = store.list_tasks().await.unwrap();
        assert_eq!(tasks[0].status, TaskStatus::Pending);
        assert_eq!(tasks[1].status, TaskStatus::Posted);
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_an_error() {
        let store = InMemoryTaskStore::new();
        let missing = TaskId::new();
        let err = store
            .update_task(missing, TaskPatch::new().retry_count(1))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(missing));
    }
}
