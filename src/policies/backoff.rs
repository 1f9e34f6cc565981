//! # Restart backoff.
//!
//! [`BackoffPolicy`] decides how long the failure supervisor waits between
//! tearing the application down and launching it again. The delay for the
//! `n`-th consecutive restart is `first × factor^n`, clamped to `max`, then
//! jittered. The counter is owned by the controller and resets after a
//! healthy heartbeat, so a flapping application backs off while a one-off
//! crash restarts quickly.
//!
//! ```rust
//! use std::time::Duration;
//! use appvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_secs(1),
//!     max: Duration::from_secs(60),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_secs(1));
//! assert_eq!(backoff.next(3), Duration::from_secs(8));
//! assert_eq!(backoff.next(10), Duration::from_secs(60));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Delay schedule for consecutive restarts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first restart of a streak.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Growth factor per consecutive restart (`>= 1.0`).
    pub factor: f64,
    /// Randomization applied to the clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `1s × 2^n`, capped at 60s, equal jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(60),
            factor: 2.0,
            jitter: JitterPolicy::Equal,
        }
    }
}

impl BackoffPolicy {
    /// Restart without any delay.
    pub fn immediate() -> Self {
        Self {
            first: Duration::ZERO,
            max: Duration::ZERO,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Delay before restart number `restarts` (0-indexed) of the current streak.
    ///
    /// The base is derived from `restarts` only, so jitter never feeds back
    /// into later delays. Non-finite or negative bases collapse to `max`.
    pub fn next(&self, restarts: u32) -> Duration {
        let exp = restarts.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}
