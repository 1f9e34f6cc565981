//! # Controller configuration.
//!
//! [`ControllerConfig`] holds the timings of one controller instance. It is
//! passed to [`ControllerBuilder::config`](crate::ControllerBuilder::config)
//! and read by all three loops.
//!
//! Values can also be loaded from the environment with
//! [`ControllerConfig::from_env`]:
//!
//! | Variable                          | Field                |
//! |-----------------------------------|----------------------|
//! | `APPVISOR_HEARTBEAT_INTERVAL_MS`  | `heartbeat_interval` |
//! | `APPVISOR_STOP_GRACE_MS`          | `stop_grace`         |
//! | `APPVISOR_FAILURE_CAPACITY`       | `failure_capacity`   |
//!
//! Unset variables keep their defaults. Zero is rejected for every field.

use std::time::Duration;

use thiserror::Error;

use crate::policies::BackoffPolicy;

/// Environment variable for [`ControllerConfig::heartbeat_interval`] (milliseconds).
pub const ENV_HEARTBEAT_INTERVAL_MS: &str = "APPVISOR_HEARTBEAT_INTERVAL_MS";
/// Environment variable for [`ControllerConfig::stop_grace`] (milliseconds).
pub const ENV_STOP_GRACE_MS: &str = "APPVISOR_STOP_GRACE_MS";
/// Environment variable for [`ControllerConfig::failure_capacity`].
pub const ENV_FAILURE_CAPACITY: &str = "APPVISOR_FAILURE_CAPACITY";

/// Invalid configuration value.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Value is not a positive integer.
    #[error("{var}: expected a positive integer, got {value:?}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Invalid { .. } => "config_invalid",
        }
    }
}

/// Timings of a controller.
///
/// ## Field semantics
/// - `heartbeat_interval`: sleep between two heartbeat cycles (the first cycle runs one interval after start)
/// - `stop_grace`: how long `stop()` waits for each loop before aborting it
/// - `failure_capacity`: buffered Critical signals; extra signals are dropped with a warning
/// - `restart_backoff`: delay before each self-healing restart
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerConfig {
    /// Sleep between heartbeat cycles.
    pub heartbeat_interval: Duration,
    /// Per-loop join timeout used by `stop()`.
    pub stop_grace: Duration,
    /// Capacity of the failure channel (min 1).
    pub failure_capacity: usize,
    /// Delay schedule for consecutive restarts.
    pub restart_backoff: BackoffPolicy,
}

impl Default for ControllerConfig {
    /// - `heartbeat_interval = 5s`
    /// - `stop_grace = 10s`
    /// - `failure_capacity = 8`
    /// - `restart_backoff = BackoffPolicy::default()`
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(5),
            stop_grace: Duration::from_secs(10),
            failure_capacity: 8,
            restart_backoff: BackoffPolicy::default(),
        }
    }
}

impl ControllerConfig {
    /// Defaults overridden by the `APPVISOR_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(ms) = positive(&lookup, ENV_HEARTBEAT_INTERVAL_MS)? {
            cfg.heartbeat_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = positive(&lookup, ENV_STOP_GRACE_MS)? {
            cfg.stop_grace = Duration::from_millis(ms);
        }
        if let Some(n) = positive(&lookup, ENV_FAILURE_CAPACITY)? {
            cfg.failure_capacity = n as usize;
        }
        Ok(cfg)
    }

    /// Failure channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn failure_capacity_clamped(&self) -> usize {
        self.failure_capacity.max(1)
    }
}

fn positive<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ConfigError::Invalid { var, value: raw }),
    }
}
