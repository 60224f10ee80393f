//! Health reporter: read-only task census for operator triage.

use std::sync::Arc;

use crate::domain::{HealthReport, StoreError, TaskStatus};
use crate::ports::{Clock, TaskStore};

/// Aggregates task counts by state, plus the derived `missed` and `upcoming`
/// buckets. Never mutates anything; safe to run at any time.
pub struct HealthReporter {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
}

impl HealthReporter {
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn report(&self) -> Result<HealthReport, StoreError> {
        let tasks = self.store.list_tasks().await?;
        let now = self.clock.now();
        let mut report = HealthReport::default();

        for task in &tasks {
            let Some(scheduled_at) = task.scheduled_at else {
                continue;
            };
            if !task.is_well_formed() {
                continue;
            }
            report.total += 1;

            match task.status {
                TaskStatus::Posted => report.posted += 1,
                TaskStatus::Failed => report.failed += 1,
                TaskStatus::Retrying => report.retrying += 1,
                TaskStatus::Pending => {
                    if scheduled_at > now {
                        report.upcoming += 1;
                        report.pending += 1;
                    } else {
                        report.missed += 1;
                    }
                }
            }
        }

        tracing::debug!(
            total = report.total,
            missed = report.missed,
            failed = report.failed,
            "health report computed"
        );
        Ok(report)
    }
}
