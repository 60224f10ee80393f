//! Reconciliation engine: one scan-and-act pass over due tasks.

use std::sync::Arc;

use crate::config::Config;
use crate::domain::{CycleSummary, PublishError, RetryPolicy, StoreError, TaskStatus};
use crate::ports::{Clock, PublishReceipt, Publisher, TaskPatch, TaskStore};

use super::generator::FutureTaskGenerator;

/// Walks the task list in store order, attempts every due task, applies the
/// retry policy, and seeds a replacement on each success.
///
/// Strictly sequential: one attempt in flight at a time, and a backoff wait
/// blocks the whole pass. That keeps the publisher's rate limits respected
/// and the store's read-all/write-one-field access pattern safe, at the cost
/// of throughput this task volume does not need.
///
/// Publish failures are captured into the task's own fields and never abort
/// the scan; only store failures do.
pub struct ReconciliationEngine {
    store: Arc<dyn TaskStore>,
    publisher: Arc<dyn Publisher>,
    generator: FutureTaskGenerator,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
}

impl ReconciliationEngine {
    pub fn new(
        store: Arc<dyn TaskStore>,
        publisher: Arc<dyn Publisher>,
        generator: FutureTaskGenerator,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            publisher,
            generator,
            policy,
            clock,
            max_attempts: config.retry.max_attempts,
        }
    }

    /// Run one pass. The summary is a side-effect log, not persisted state.
    pub async fn run(&self) -> Result<CycleSummary, StoreError> {
        let tasks = self.store.list_tasks().await?;
        let now = self.clock.now();
        let mut summary = CycleSummary::default();

        for task in tasks {
            if !task.is_well_formed() {
                summary.skipped += 1;
                continue;
            }
            if !task.is_due(now) {
                continue;
            }
            let Some(scheduled_at) = task.scheduled_at else {
                continue;
            };

            if task.retry_count >= self.max_attempts {
                self.store
                    .update_task(
                        task.id,
                        TaskPatch::new()
                            .status(TaskStatus::Failed)
                            .error(format!(
                                "max retries reached ({}/{})",
                                task.retry_count, self.max_attempts
                            ))
                            .retry_count(task.retry_count),
                    )
                    .await?;
                summary.failed += 1;
                tracing::warn!(task = %task.id, "retry budget exhausted, not attempting");
                continue;
            }

            // Visible progress signal before a retry attempt.
            if task.retry_count > 0 {
                self.store
                    .update_task(
                        task.id,
                        TaskPatch::new()
                            .status(TaskStatus::Retrying)
                            .error(format!("retry {}/{}", task.retry_count, self.max_attempts))
                            .retry_count(task.retry_count),
                    )
                    .await?;
            }

            match self.attempt(&task.content, task.retry_count).await {
                Ok(receipt) => {
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
                    tracing::info!(
                        task = %task.id,
                        http_status = receipt.http_status,
                        post_id = receipt.post_id.as_deref().unwrap_or("-"),
                        "posted"
                    );

                    // Replacement failures must not undo the recorded success.
                    if let Err(error) = self.generator.replicate(scheduled_at).await {
                        tracing::warn!(task = %task.id, %error, "replacement task not created");
                    }
                }
                Err(failure) => {
                    let retry_count = task.retry_count + 1;
                    let status = if retry_count >= self.max_attempts || !failure.is_retryable() {
                        TaskStatus::Failed
                    } else {
                        TaskStatus::Retrying
                    };
                    self.store
                        .update_task(
                            task.id,
                            TaskPatch::new()
                                .status(status)
                                .error(failure.to_string())
                                .retry_count(retry_count),
                        )
                        .await?;
                    summary.failed += 1;
                    tracing::warn!(
                        task = %task.id,
                        retry_count,
                        %failure,
                        "publish attempt failed"
                    );
                }
            }
        }

        tracing::info!(
            posted = summary.posted,
            failed = summary.failed,
            skipped = summary.skipped,
            "reconciliation pass complete"
        );
        Ok(summary)
    }

    /// One delivery attempt. Retries wait out the policy delay first; a first
    /// attempt goes straight through.
    async fn attempt(
        &self,
        content: &str,
        retry_count: u32,
    ) -> Result<PublishReceipt, PublishError> {
        if content.trim().is_empty() {
            return Err(PublishError::EmptyContent);
        }
        if retry_count > 0 {
            let delay = self.policy.delay(retry_count);
            tracing::debug!(delay_ms = delay.as_millis() as u64, "backing off before retry");
            tokio::time::sleep(delay).await;
        }
        self.publisher.publish(content).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::app::testutil::{ScriptedPublisher, noon, receipt};
    use crate::domain::Task;
    use crate::impls::{InMemoryTaskStore, StaticContentPool};
    use crate::ports::FixedClock;

    struct Fixture {
        engine: ReconciliationEngine,
        store: Arc<InMemoryTaskStore>,
        publisher: Arc<ScriptedPublisher>,
    }

    fn fixture(tasks: Vec<Task>, publisher: ScriptedPublisher) -> Fixture {
        fixture_with_pool(tasks, publisher, vec!["https://pics.example/1".into()])
    }

    fn fixture_with_pool(
        tasks: Vec<Task>,
        publisher: ScriptedPublisher,
        pool: Vec<String>,
    ) -> Fixture {
        let store = Arc::new(InMemoryTaskStore::with_tasks(tasks));
        let publisher = Arc::new(publisher);
        let clock = Arc::new(FixedClock::new(noon()));
        let store_dyn: Arc<dyn TaskStore> = store.clone();
        let publisher_dyn: Arc<dyn Publisher> = publisher.clone();
        let config = Config::default();
        let generator = FutureTaskGenerator::new(
            Arc::clone(&store_dyn),
            Arc::new(StaticContentPool::new(pool)),
            &config,
        );
        let engine = ReconciliationEngine::new(
            Arc::clone(&store_dyn),
            publisher_dyn,
            generator,
            RetryPolicy::new(StdDuration::from_millis(1), 2.0),
            clock,
            &config,
        );
        Fixture {
            engine,
            store,
            publisher,
        }
    }

    fn due_task(content: &str) -> Task {
        Task::new(noon() - Duration::hours(1), content)
    }

    #[tokio::test]
    async fn successful_publish_posts_and_seeds_replacement() {
        let task = due_task("A");
        let id = task.id;
        let f = fixture(vec![task], ScriptedPublisher::always_ok());

        let summary = f.engine.run().await.unwrap();
        assert_eq!(summary.posted, 1);
        assert_eq!(summary.failed, 0);

        let tasks = f.store.list_tasks().await.unwrap();
        assert_eq!(tasks.len(), 2, "exactly one replacement appended");

        let posted = tasks.iter().find(|t| t.id == id).unwrap();
        assert_eq!(posted.status, TaskStatus::Posted);
        assert_eq!(posted.retry_count, 0);
        assert!(posted.error_message.is_none());

        let replacement = tasks.iter().find(|t| t.id != id).unwrap();
        assert_eq!(replacement.status, TaskStatus::Pending);
        // 14 calendar years after the original 2026-06-01 11:00 instant.
        assert_eq!(
            replacement.scheduled_at,
            Some(Utc.with_ymd_and_hms(2040, 6, 1, 11, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn exhausted_task_is_failed_without_an_attempt() {
        let mut task = due_task("A");
        task.status = TaskStatus::Failed;
        task.retry_count = 3;
        let id = task.id;
        let f = fixture(vec![task], ScriptedPublisher::always_ok());

        let summary = f.engine.run().await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(f.publisher.call_count(), 0, "no publish attempt");

        let tasks = f.store.list_tasks().await.unwrap();
        let failed = tasks.iter().find(|t| t.id == id).unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert_eq!(failed.retry_count, 3);
        assert!(
            failed
                .error_message
                .as_deref()
                .unwrap()
                .contains("max retries reached (3/3)")
        );
    }

    #[tokio::test]
    async fn failure_below_max_marks_retrying_and_increments() {
        let task = due_task("A");
        let id = task.id;
        let f = fixture(
            vec![task],
            ScriptedPublisher::failing_with(
                PublishError::from_http(503, "upstream server error (HTTP 503)"),
                1,
            ),
        );

        let summary = f.engine.run().await.unwrap();
        assert_eq!(summary.failed, 1);

        let tasks = f.store.list_tasks().await.unwrap();
        let failed = tasks.iter().find(|t| t.id == id).unwrap();
        assert_eq!(failed.status, TaskStatus::Retrying);
        assert_eq!(failed.retry_count, 1);
        assert!(
            failed
                .error_message
                .as_deref()
                .unwrap()
                .contains("HTTP 503")
        );
        assert_eq!(tasks.len(), 1, "no replacement on failure");
    }

    #[tokio::test]
    async fn failure_reaching_max_is_terminal() {
        let mut task = due_task("A");
        task.status = TaskStatus::Retrying;
        task.retry_count = 2;
        let id = task.id;
        let f = fixture(
            vec![task],
            ScriptedPublisher::failing_with(
                PublishError::RateLimited {
                    detail: "rate limited".into(),
                },
                1,
            ),
        );

        f.engine.run().await.unwrap();
        let tasks = f.store.list_tasks().await.unwrap();
        let failed = tasks.iter().find(|t| t.id == id).unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert_eq!(failed.retry_count, 3);
    }

    #[tokio::test]
    async fn auth_failure_fails_the_task_directly() {
        let task = due_task("A");
        let id = task.id;
        let f = fixture(
            vec![task],
            ScriptedPublisher::failing_with(PublishError::AuthRequired, 1),
        );

        f.engine.run().await.unwrap();
        let tasks = f.store.list_tasks().await.unwrap();
        let failed = tasks.iter().find(|t| t.id == id).unwrap();
        assert_eq!(failed.status, TaskStatus::Failed, "not worth burning retries on");
        assert_eq!(failed.retry_count, 1);
        assert!(
            failed
                .error_message
                .as_deref()
                .unwrap()
                .contains("authentication required")
        );
    }

    #[tokio::test]
    async fn malformed_rows_are_counted_skipped() {
        let mut no_time = due_task("A");
        no_time.scheduled_at = None;
        let blank = due_task("   ");
        let f = fixture(vec![no_time, blank], ScriptedPublisher::always_ok());

        let summary = f.engine.run().await.unwrap();
        assert_eq!(summary.skipped, 2);
        assert_eq!(f.publisher.call_count(), 0);
    }

    #[tokio::test]
    async fn posted_and_future_tasks_are_left_alone() {
        let mut posted = due_task("A");
        posted.status = TaskStatus::Posted;
        let future = Task::new(noon() + Duration::hours(2), "B");
        let f = fixture(vec![posted, future], ScriptedPublisher::always_ok());

        let summary = f.engine.run().await.unwrap();
        assert_eq!(summary, CycleSummary::default());
        assert_eq!(f.publisher.call_count(), 0);
    }

    #[tokio::test]
    async fn scan_continues_past_failing_tasks() {
        let bad = due_task("A");
        let good = due_task("B");
        let good_id = good.id;
        let f = fixture(
            vec![bad, good],
            ScriptedPublisher::new(vec![
                Err(PublishError::Transport("connection reset".into())),
                Ok(receipt()),
            ]),
        );

        let summary = f.engine.run().await.unwrap();
        assert_eq!(summary.posted, 1);
        assert_eq!(summary.failed, 1);

        let tasks = f.store.list_tasks().await.unwrap();
        let posted = tasks.iter().find(|t| t.id == good_id).unwrap();
        assert_eq!(posted.status, TaskStatus::Posted);
    }

    #[tokio::test]
    async fn retry_counts_never_decrease_across_cycles() {
        let task = due_task("A");
        let id = task.id;
        let f = fixture(
            vec![task],
            ScriptedPublisher::failing_with(PublishError::Transport("down".into()), 8),
        );

        let mut last = 0;
        for _ in 0..4 {
            f.engine.run().await.unwrap();
            let tasks = f.store.list_tasks().await.unwrap();
            let current = tasks.iter().find(|t| t.id == id).unwrap().retry_count;
            assert!(current >= last);
            last = current;
        }
        assert_eq!(last, 3, "stops counting at the budget");
    }

    #[tokio::test]
    async fn empty_pool_does_not_undo_the_success() {
        let task = due_task("A");
        let id = task.id;
        let f = fixture_with_pool(vec![task], ScriptedPublisher::always_ok(), vec![]);

        let summary = f.engine.run().await.unwrap();
        assert_eq!(summary.posted, 1);

        let tasks = f.store.list_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1, "no replacement from an empty pool");
        assert_eq!(tasks.iter().find(|t| t.id == id).unwrap().status, TaskStatus::Posted);
    }
}
