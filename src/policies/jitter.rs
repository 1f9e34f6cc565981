//! # Jitter for restart delays.
//!
//! - [`JitterPolicy::None`] exact delay.
//! - [`JitterPolicy::Full`] random in `[0, delay]`.
//! - [`JitterPolicy::Equal`] `delay/2 + random[0, delay/2]`.

use std::time::Duration;

use rand::Rng;

/// Randomization applied on top of a [`BackoffPolicy`](crate::BackoffPolicy) delay.
///
/// Several controllers supervising applications on the same host tend to
/// crash together (shared display server, network drop); jitter keeps their
/// relaunches from lining up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Use the delay as computed.
    #[default]
    None,
    /// Uniform in `[0, delay]`.
    Full,
    /// Half the delay plus a uniform share of the other half.
    Equal,
}

impl JitterPolicy {
    /// Applies this jitter to `delay`. Zero stays zero.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis() as u64;
        if ms == 0 {
            return delay;
        }
        let mut rng = rand::rng();
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => Duration::from_millis(rng.random_range(0..=ms)),
            JitterPolicy::Equal => {
                let half = ms / 2;
                Duration::from_millis(half + rng.random_range(0..=ms - half))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_identity() {
        let d = Duration::from_millis(1234);
        assert_eq!(JitterPolicy::None.apply(d), d);
    }

    #[test]
    fn test_zero_delay_stays_zero() {
        for j in [JitterPolicy::None, JitterPolicy::Full, JitterPolicy::Equal] {
            assert_eq!(j.apply(Duration::ZERO), Duration::ZERO);
        }
    }

    #[test]
    fn test_full_bounds() {
        for _ in 0..200 {
            assert!(JitterPolicy::Full.apply(Duration::from_millis(800)) <= Duration::from_millis(800));
        }
    }

    #[test]
    fn test_equal_bounds_with_odd_delay() {
        for _ in 0..200 {
            let d = JitterPolicy::Equal.apply(Duration::from_millis(1));
            assert!(d <= Duration::from_millis(1));

            let d = JitterPolicy::Equal.apply(Duration::from_millis(999));
            assert!(d >= Duration::from_millis(499));
            assert!(d <= Duration::from_millis(999));
        }
    }
}
