//! Missed task detector: converts silent misses into visible failures.

use std::sync::Arc;

use crate::domain::{StoreError, TaskStatus};
use crate::ports::{Clock, TaskPatch, TaskStore};

/// Scans for tasks whose window passed with no attempt ever recorded (for
/// example because the daily cycle did not run) and marks them failed with an
/// elapsed-time diagnostic. Without this a missed post stays indefinitely
/// ambiguous: neither attempted nor actionable.
///
/// Idempotent: posted, failed and retrying tasks are untouched, and a marked
/// task is no longer pending, so a second run with the same clock is a no-op.
pub struct MissedTaskDetector {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
}

impl MissedTaskDetector {
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Mark every missed task failed. Returns how many rows were marked.
    pub async fn run(&self) -> Result<usize, StoreError> {
        let tasks = self.store.list_tasks().await?;
        let now = self.clock.now();
        let mut marked = 0;

        for task in tasks {
            if !task.is_missed(now) {
                continue;
            }
            let Some(scheduled_at) = task.scheduled_at else {
                continue;
            };

            let overdue = now - scheduled_at;
            let hours = overdue.num_hours();
            let minutes = overdue.num_minutes() - hours * 60;

            self.store
                .update_task(
                    task.id,
                    TaskPatch::new()
                        .status(TaskStatus::Failed)
                        .error(format!("missed post window ({hours}h {minutes:02}m overdue)"))
                        .retry_count(0),
                )
                .await?;
            marked += 1;
            tracing::warn!(task = %task.id, %scheduled_at, "missed post detected");
        }

        if marked > 0 {
            tracing::info!(marked, "missed tasks reclassified as failed");
        }
        Ok(marked)
    }
}
