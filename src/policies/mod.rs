//! Timing policies for the failure supervisor.
//!
//! - [`BackoffPolicy`] delay before each self-healing restart;
//! - [`JitterPolicy`] randomization of that delay.

pub mod backoff;
pub mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
