//! File-backed store and pool: thin persistence glue for the CLI.

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::Mutex;

use encore_core::domain::{StoreError, Task, TaskId};
use encore_core::ports::{ContentPool, TaskPatch, TaskStore};

/// Task store persisted as one JSON array. The whole list is rewritten on
/// every mutation; fine for the task volumes this tool is built for.
pub struct JsonFileStore {
    path: PathBuf,
    tasks: Mutex<Vec<Task>>,
}

impl JsonFileStore {
    /// Load the store, creating an empty one when the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let tasks = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read task store: {}", path.display()))?;
            if raw.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&raw)
                    .with_context(|| format!("malformed task store: {}", path.display()))?
            }
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            tasks: Mutex::new(tasks),
        })
    }

    fn persist(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let json =
            serde_json::to_string_pretty(tasks).map_err(|e| StoreError::Backend(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl TaskStore for JsonFileStore {
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
        self.persist(&tasks)
    }

    async fn append_task(&self, task: Task) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock().await;
        tasks.push(task);
        self.persist(&tasks)
    }
}

/// Link pool read from a plain text file, one link per line. Blank lines are
/// dropped; a missing file is an empty pool, not an error.
pub struct LineFilePool {
    path: PathBuf,
}

impl LineFilePool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ContentPool for LineFilePool {
    async fn list_entries(&self) -> Result<Vec<String>, StoreError> {
        if !self.path.exists() {
            tracing::warn!(path = %self.path.display(), "link pool file not found");
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}
