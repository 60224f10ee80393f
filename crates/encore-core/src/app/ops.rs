//! Operator actions over failed tasks: reset, list, post-now, retry-now.
//!
//! These are remediation tools invoked by a human, not part of the automatic
//! cycle. [`FailedTaskOps`] only inspects and resets store state;
//! [`ManualPostOps`] additionally publishes, so it carries the publisher and
//! the generator. Immediate attempts are always fresh ones (no backoff wait),
//! spaced out with a fixed delay to stay inside the publisher's rate limits.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::{StoreError, Task, TaskId, TaskStatus};
use crate::ports::{Publisher, TaskPatch, TaskStore};

use super::generator::FutureTaskGenerator;

/// Spacing between immediate retry attempts.
const RETRY_SPACING: Duration = Duration::from_secs(2);

/// Spacing between immediate post-now attempts.
const POST_SPACING: Duration = Duration::from_secs(3);

/// Snapshot of one failed task for operator display.
#[derive(Debug, Clone)]
pub struct FailedTaskView {
    pub id: TaskId,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub retry_count: u32,
    pub error_message: Option<String>,
    pub content: String,
}

impl From<&Task> for FailedTaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            scheduled_at: task.scheduled_at,
            status: task.status,
            retry_count: task.retry_count,
            error_message: task.error_message.clone(),
            content: task.content.clone(),
        }
    }
}

/// Attempt counts of one remediation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemediationSummary {
    pub attempted: usize,
    pub posted: usize,
    pub failed: usize,
}

/// Inspect-and-reset operations; never publishes.
pub struct FailedTaskOps {
    store: Arc<dyn TaskStore>,
}

impl FailedTaskOps {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Put every failed and retrying task back to pending with a fresh retry
    /// budget and no diagnostic. The only road out of `Failed`.
    pub async fn reset(&self) -> Result<usize, StoreError> {
        let tasks = self.store.list_tasks().await?;
        let mut reset = 0;

        for task in tasks {
            if !task.status.requires_remediation() {
                continue;
            }
            self.store
                .update_task(
                    task.id,
                    TaskPatch::new()
                        .status(TaskStatus::Pending)
                        .clear_error()
                        .retry_count(0),
                )
                .await?;
            reset += 1;
        }

        tracing::info!(reset, "failed tasks reset to pending");
        Ok(reset)
    }

    /// Snapshot every failed and retrying task, in store order.
    pub async fn list(&self) -> Result<Vec<FailedTaskView>, StoreError> {
        let tasks = self.store.list_tasks().await?;
        Ok(tasks
            .iter()
            .filter(|t| t.status.requires_remediation())
            .map(FailedTaskView::from)
            .collect())
    }
}

/// Immediate publish attempts against failed tasks.
pub struct ManualPostOps {
    store: Arc<dyn TaskStore>,
    publisher: Arc<dyn Publisher>,
    generator: FutureTaskGenerator,
}

impl ManualPostOps {
    pub fn new(
        store: Arc<dyn TaskStore>,
        publisher: Arc<dyn Publisher>,
        generator: FutureTaskGenerator,
    ) -> Self {
        Self {
            store,
            publisher,
            generator,
        }
    }

    /// Immediately attempt failed tasks until `max` have posted. Successes
    /// are recorded and seed replacements like any other publish; failures
    /// only hit the log, leaving the row for the next remediation.
    pub async fn post_now(&self, max: usize) -> Result<RemediationSummary, StoreError> {
        let tasks = self.store.list_tasks().await?;
        let mut summary = RemediationSummary::default();

        for task in tasks {
            if summary.posted >= max {
                break;
            }
            if !task.status.requires_remediation() || task.content.trim().is_empty() {
                continue;
            }

            if summary.attempted > 0 {
                tokio::time::sleep(POST_SPACING).await;
            }
            summary.attempted += 1;

            match self.publisher.publish(&task.content).await {
                Ok(_) => {
                    self.store
                        .update_task(
                            task.id,
                            TaskPatch::new()
                                .status(TaskStatus::Posted)
                                .clear_error()
                                .retry_count(0),
                        )
                        .await?;
                    summary.posted += 1;
                    tracing::info!(task = %task.id, "posted immediately");

                    if let Some(scheduled_at) = task.scheduled_at {
                        if let Err(error) = self.generator.replicate(scheduled_at).await {
                            tracing::warn!(task = %task.id, %error, "replacement task not created");
                        }
                    }
                }
                Err(failure) => {
                    summary.failed += 1;
                    tracing::warn!(task = %task.id, %failure, "immediate post failed");
                }
            }
        }

        tracing::info!(
            attempted = summary.attempted,
            posted = summary.posted,
            failed = summary.failed,
            "post-now complete"
        );
        Ok(summary)
    }

    /// Immediately re-attempt every failed and retrying task. A failure here
    /// is recorded on the row and counts against the retry budget.
    pub async fn retry_now(&self) -> Result<RemediationSummary, StoreError> {
        let tasks = self.store.list_tasks().await?;
        let mut summary = RemediationSummary::default();

        for task in tasks {
            if !task.status.requires_remediation() || task.content.trim().is_empty() {
                continue;
            }

            if summary.attempted > 0 {
                tokio::time::sleep(RETRY_SPACING).await;
            }
            summary.attempted += 1;

            match self.publisher.publish(&task.content).await {
                Ok(_) => {
                    self.store
                        .update_task(
                            task.id,
                            TaskPatch::new()
                                .status(TaskStatus::Posted)
                                .clear_error()
                                .retry_count(0),
                        )
                        .await?;
                    summary.posted += 1;
                    tracing::info!(task = %task.id, "manual retry succeeded");
                }
                Err(failure) => {
                    self.store
                        .update_task(
                            task.id,
                            TaskPatch::new()
                                .status(TaskStatus::Failed)
                                .error(failure.to_string())
                                .retry_count(task.retry_count + 1),
                        )
                        .await?;
                    summary.failed += 1;
                    tracing::warn!(task = %task.id, %failure, "manual retry failed");
                }
            }
        }

        tracing::info!(
            attempted = summary.attempted,
            posted = summary.posted,
            failed = summary.failed,
            "retry-now complete"
        );
        Ok(summary)
    }
}
