use std::fmt;

use serde::{Deserialize, Serialize};

/// Controller-wide health.
///
/// ```text
/// Uninitialised ──► Starting ──► { Healthy ⇄ Degraded ⇄ Error } ──► Stopped ──► Starting ...
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Never started.
    #[default]
    Uninitialised,
    /// `start()` in progress or no heartbeat cycle finished yet.
    Starting,
    /// Last cycle saw no failing check.
    Healthy,
    /// Only activity checks failed.
    Degraded,
    /// A base or application-core check failed, or a failure handler panicked.
    Error,
    /// `stop()` completed.
    Stopped,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Uninitialised => "uninitialised",
            HealthState::Starting => "starting",
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Error => "error",
            HealthState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal pushed to the failure supervisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthFailure {
    /// A base check failed; the application must be restarted.
    Critical,
}
