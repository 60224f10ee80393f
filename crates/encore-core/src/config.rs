//! Configuration: the single source of tunables.
//!
//! One immutable [`Config`] value is constructed at startup (from a TOML file
//! or the defaults) and handed to each component. Components copy what they
//! need; nothing reads configuration through global state.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid trigger time {hour:02}:{minute:02}")]
    InvalidTriggerTime { hour: u32, minute: u32 },

    #[error("max_attempts must be at least 1")]
    ZeroMaxAttempts,

    #[error("backoff_multiplier must be at least 1.0, got {0}")]
    ShrinkingBackoff(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub retry: RetryConfig,
    pub schedule: ScheduleConfig,
    pub publisher: PublisherConfig,

    /// Prepended to every pool-drawn link when a replacement task is created.
    pub content_prefix: String,

    /// When set, a cycle runs the engine before the missed-task detector so
    /// an overdue never-attempted task gets exactly one live attempt before
    /// it can be marked missed. Off by default: detect first, then attempt.
    pub attempt_missed_before_failing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            schedule: ScheduleConfig::default(),
            publisher: PublisherConfig::default(),
            content_prefix: String::new(),
            attempt_missed_before_failing: false,
        }
    }
}

impl Config {
    /// Reject values the scheduler cannot work with. Called once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::ShrinkingBackoff(self.retry.backoff_multiplier));
        }
        if self.schedule.trigger_time().is_none() {
            return Err(ConfigError::InvalidTriggerTime {
                hour: self.schedule.trigger_hour,
                minute: self.schedule.trigger_minute,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts before a task is failed for good.
    pub max_attempts: u32,

    /// Wait before the first retry, in milliseconds.
    pub initial_delay_ms: u64,

    /// Wait multiplier per further retry.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Daily trigger wall-clock hour (UTC).
    pub trigger_hour: u32,

    /// Daily trigger wall-clock minute.
    pub trigger_minute: u32,

    /// Calendar years between a posted task and its replacement.
    pub years_ahead: u32,
}

impl ScheduleConfig {
    /// The configured time-of-day, `None` when out of range.
    pub fn trigger_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.trigger_hour, self.trigger_minute, 0)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            trigger_hour: 19,
            trigger_minute: 30,
            years_ahead: 14,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Post-creation endpoint of the publishing provider. Required for every
    /// command that actually publishes.
    pub endpoint: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn default_trigger_is_evening() {
        let schedule = ScheduleConfig::default();
        assert_eq!(
            schedule.trigger_time(),
            NaiveTime::from_hms_opt(19, 30, 0)
        );
    }

    #[test]
    fn out_of_range_trigger_is_rejected() {
        let mut config = Config::default();
        config.schedule.trigger_hour = 24;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTriggerTime { hour: 24, .. })
        ));
    }

    #[test]
    fn shrinking_backoff_is_rejected() {
        let mut config = Config::default();
        config.retry.backoff_multiplier = 0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ShrinkingBackoff(_))
        ));
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: Config = serde_json::from_str(r#"{"retry":{"max_attempts":5}}"#).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay_ms, 1000);
        assert_eq!(config.schedule.years_ahead, 14);
    }
}
