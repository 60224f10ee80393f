//! Application layer: the components that drive the task list.
//!
//! - **ReconciliationEngine**: one scan-and-act pass over due tasks
//! - **MissedTaskDetector**: reclassifies silently-overdue tasks
//! - **FutureTaskGenerator**: seeds a far-future replacement on success
//! - **HealthReporter**: read-only task census
//! - **BulkRescheduler**: operator batch remediation of failed tasks
//! - **FailedTaskOps**: reset / list / post-now / retry-now
//! - **CycleRunner**: detector + engine composition for one triggered cycle

pub mod cycle;
pub mod detector;
pub mod engine;
pub mod generator;
pub mod health;
pub mod ops;
pub mod rescheduler;

pub use cycle::{CycleRunner, next_trigger_after};
pub use detector::MissedTaskDetector;
pub use engine::ReconciliationEngine;
pub use generator::FutureTaskGenerator;
pub use health::HealthReporter;
pub use ops::{FailedTaskOps, FailedTaskView, ManualPostOps, RemediationSummary};
pub use rescheduler::{BulkRescheduler, RescheduleMode, RescheduleMove};

#[cfg(test)]
pub(crate) mod testutil {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};

    use crate::domain::PublishError;
    use crate::ports::{PublishReceipt, Publisher};

    pub fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    pub fn receipt() -> PublishReceipt {
        PublishReceipt {
            http_status: 201,
            post_id: Some("1450079827906686976".into()),
        }
    }

    /// Publisher that plays back a script of outcomes, then succeeds.
    pub struct ScriptedPublisher {
        outcomes: Mutex<VecDeque<Result<PublishReceipt, PublishError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedPublisher {
        pub fn new(outcomes: Vec<Result<PublishReceipt, PublishError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn always_ok() -> Self {
            Self::new(Vec::new())
        }

        pub fn failing_with(error: PublishError, times: usize) -> Self {
            Self::new(vec![Err(error); times])
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl Publisher for ScriptedPublisher {
        async fn publish(&self, _text: &str) -> Result<PublishReceipt, PublishError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let next = self.outcomes.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(receipt()))
        }
    }
}
