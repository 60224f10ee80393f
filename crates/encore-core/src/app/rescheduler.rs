//! Bulk rescheduler: operator batch remediation of failed tasks.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};

use crate::config::Config;
use crate::domain::{StoreError, TaskId, TaskStatus};
use crate::ports::{Clock, TaskPatch, TaskStore};

/// How the rescheduled time-of-day is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescheduleMode {
    /// Every rescheduled task gets the configured daily trigger time.
    AtTriggerTime,

    /// Only the date shifts; each task keeps its original time-of-day.
    PreserveOriginalTime,
}

/// One performed move, for operator display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescheduleMove {
    pub id: TaskId,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Spreads failed and retrying tasks over future days so they can be retried
/// at a sustainable pace instead of all at once. Earliest-failed-first: tasks
/// are sorted by their original scheduled instant and assigned slots in that
/// order. Never publishes anything.
pub struct BulkRescheduler {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
    trigger_time: NaiveTime,
}

impl BulkRescheduler {
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self {
            store,
            clock,
            // Out-of-range values are rejected by Config::validate at startup.
            trigger_time: config.schedule.trigger_time().unwrap_or(NaiveTime::MIN),
        }
    }

    /// Assign new scheduled times `base + i * interval_days` to the i-th
    /// eligible task in sorted order, where `base` is `start_offset_days`
    /// from today. Each moved task is reset to pending with a fresh retry
    /// budget and a cleared diagnostic.
    pub async fn reschedule(
        &self,
        start_offset_days: i64,
        interval_days: i64,
        mode: RescheduleMode,
    ) -> Result<Vec<RescheduleMove>, StoreError> {
        let tasks = self.store.list_tasks().await?;
        let now = self.clock.now();

        let mut eligible: Vec<(TaskId, DateTime<Utc>)> = tasks
            .into_iter()
            .filter(|t| t.status.requires_remediation() && t.is_well_formed())
            .filter_map(|t| t.scheduled_at.map(|at| (t.id, at)))
            .collect();

        if eligible.is_empty() {
            tracing::info!("no failed or retrying tasks to reschedule");
            return Ok(Vec::new());
        }

        eligible.sort_by_key(|(_, at)| *at);

        let base_date = (now + Duration::days(start_offset_days)).date_naive();
        let mut moves = Vec::with_capacity(eligible.len());

        for (i, (id, original)) in eligible.into_iter().enumerate() {
            let date = base_date + Duration::days(i as i64 * interval_days);
            let time = match mode {
                RescheduleMode::AtTriggerTime => self.trigger_time,
                RescheduleMode::PreserveOriginalTime => original.time(),
            };
            let to = NaiveDateTime::new(date, time).and_utc();

            self.store
                .update_task(
                    id,
                    TaskPatch::new()
                        .scheduled_at(to)
                        .status(TaskStatus::Pending)
                        .clear_error()
                        .retry_count(0),
                )
                .await?;
            tracing::info!(task = %id, %original, rescheduled_to = %to, "task rescheduled");
            moves.push(RescheduleMove {
                id,
                from: original,
                to,
            });
        }

        tracing::info!(count = moves.len(), "bulk reschedule complete");
        Ok(moves)
    }
}
