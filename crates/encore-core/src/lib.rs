//! encore-core
//!
//! Reconciliation engine for a small list of scheduled post tasks: scans the
//! persisted list against wall-clock time, delivers due posts through an
//! external publisher with retry/backoff, detects silently missed windows,
//! and seeds a far-future replacement for every success.
//!
//! # Module map
//! - **config**: the single immutable source of tunables
//! - **domain**: task model, retry policy, error taxonomy, derived views
//! - **ports**: abstract interfaces to external collaborators (store, pool,
//!   publisher, credentials, clock)
//! - **app**: engine, detector, generator, health reporter, rescheduler,
//!   failed-task ops, cycle runner
//! - **impls**: in-memory store/pool, HTTP publisher, credential providers

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{
    BulkRescheduler, CycleRunner, FailedTaskOps, FailedTaskView, FutureTaskGenerator,
    HealthReporter, ManualPostOps, MissedTaskDetector, ReconciliationEngine, RemediationSummary,
    RescheduleMode, RescheduleMove, next_trigger_after,
};
pub use config::{Config, ConfigError, PublisherConfig, RetryConfig, ScheduleConfig};
pub use domain::{
    CredentialError, CycleSummary, HealthReport, PublishError, RetryPolicy, StoreError, Task,
    TaskId, TaskStatus,
};
pub use ports::{
    Clock, ContentPool, CredentialProvider, FixedClock, PublishReceipt, Publisher, SystemClock,
    TaskPatch, TaskStore,
};
