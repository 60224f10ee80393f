//! Future task generator: each successful post seeds its own replacement.

use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use rand::seq::SliceRandom;

use crate::config::Config;
use crate::domain::{StoreError, Task};
use crate::ports::{ContentPool, TaskStore};

/// Invoked by the engine after every successful publish. Draws one link from
/// the pool and appends a pending task far in the future, anchored on the
/// *original* scheduled instant rather than on the current time. The result
/// is a self-perpetuating schedule that needs no operator feeding.
pub struct FutureTaskGenerator {
    store: Arc<dyn TaskStore>,
    pool: Arc<dyn ContentPool>,
    content_prefix: String,
    years_ahead: u32,
}

impl FutureTaskGenerator {
    pub fn new(store: Arc<dyn TaskStore>, pool: Arc<dyn ContentPool>, config: &Config) -> Self {
        Self {
            store,
            pool,
            content_prefix: config.content_prefix.clone(),
            years_ahead: config.schedule.years_ahead,
        }
    }

    /// Create one replacement task. Returns the appended task, or `None` when
    /// generation was skipped (empty pool, instant out of calendar range);
    /// skipping never affects the already-recorded success.
    pub async fn replicate(&self, original: DateTime<Utc>) -> Result<Option<Task>, StoreError> {
        let entries = self.pool.list_entries().await?;
        let links: Vec<&String> = entries.iter().filter(|l| !l.trim().is_empty()).collect();

        let Some(link) = links.choose(&mut rand::thread_rng()) else {
            tracing::warn!("content pool has no usable entries, skipping replacement");
            return Ok(None);
        };

        let Some(future) = add_years(original, self.years_ahead) else {
            tracing::warn!(%original, "scheduled instant out of calendar range, skipping replacement");
            return Ok(None);
        };

        let task = Task::new(future, format!("{}{}", self.content_prefix, link));
        self.store.append_task(task.clone()).await?;
        tracing::info!(task = %task.id, scheduled_at = %future, "replacement task appended");
        Ok(Some(task))
    }
}

/// Calendar year arithmetic: month, day and time-of-day are preserved.
/// Feb 29 clamps to Feb 28 when the target year is not a leap year.
pub(crate) fn add_years(at: DateTime<Utc>, years: u32) -> Option<DateTime<Utc>> {
    at.checked_add_months(Months::new(years * 12))
}
