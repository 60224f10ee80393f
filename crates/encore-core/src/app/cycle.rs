//! Cycle runner: the composition invoked by the daily trigger.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};

use crate::domain::{CycleSummary, StoreError};

use super::detector::MissedTaskDetector;
use super::engine::ReconciliationEngine;

/// One automatic cycle: missed-task detection plus a reconciliation pass.
///
/// Detection runs first by default, so a silent miss becomes visible even if
/// the attempt that follows fails too. With `attempt_missed_before_failing`
/// the order flips: an overdue never-attempted task gets exactly one live
/// attempt before it can be marked missed.
///
/// Not re-entrant; the trigger mechanism must guarantee single-flight runs.
pub struct CycleRunner {
    detector: MissedTaskDetector,
    engine: ReconciliationEngine,
    attempt_missed_before_failing: bool,
}

impl CycleRunner {
    pub fn new(
        detector: MissedTaskDetector,
        engine: ReconciliationEngine,
        attempt_missed_before_failing: bool,
    ) -> Self {
        Self {
            detector,
            engine,
            attempt_missed_before_failing,
        }
    }

    /// Run one full cycle to completion.
    pub async fn run_once(&self) -> Result<CycleSummary, StoreError> {
        if self.attempt_missed_before_failing {
            let summary = self.engine.run().await?;
            self.detector.run().await?;
            Ok(summary)
        } else {
            self.detector.run().await?;
            self.engine.run().await
        }
    }
}

/// Next daily trigger instant strictly after `now`: today at the configured
/// time if that is still ahead, otherwise tomorrow.
pub fn next_trigger_after(now: DateTime<Utc>, trigger: NaiveTime) -> DateTime<Utc> {
    let today = NaiveDateTime::new(now.date_naive(), trigger).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}
