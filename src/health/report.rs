//! # Health evaluation and escalation.
//!
//! [`evaluate`] runs every check of a cycle concurrently (no short-circuit)
//! and sorts the failures into three buckets. [`HealthReport::verdict`]
//! then applies the escalation ladder:
//!
//! ```text
//! base failure?      ──yes──► Critical        → Error,    restart
//!      │no
//! core failure?      ──yes──► CoreFailure     → Error,    core handler
//!      │no
//! activity failure?  ──yes──► ActivityFailure → Degraded, activity handler
//!      │no
//!      └───────────────────► Healthy         → Healthy
//! ```
//!
//! ## Rules
//! - A base failure supersedes everything else; handlers are not called.
//! - `Healthy` iff all three buckets are empty.
//! - `Degraded` only when base and core buckets are both empty.

use futures::future::join_all;
use serde::Serialize;

use crate::app::Tag;
use crate::health::check::{BaseCheck, HealthCheck};
use crate::health::state::HealthState;

/// Outcome class of one heartbeat cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Healthy,
    ActivityFailure,
    CoreFailure,
    Critical,
}

impl Verdict {
    /// State the controller moves to for this verdict.
    pub fn health_state(self) -> HealthState {
        match self {
            Verdict::Healthy => HealthState::Healthy,
            Verdict::ActivityFailure => HealthState::Degraded,
            Verdict::CoreFailure | Verdict::Critical => HealthState::Error,
        }
    }
}

/// Failing checks of one cycle, per bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HealthReport<C> {
    pub base: Vec<BaseCheck>,
    pub core: Vec<C>,
    pub activity: Vec<C>,
}

impl<C> Default for HealthReport<C> {
    fn default() -> Self {
        Self {
            base: Vec::new(),
            core: Vec::new(),
            activity: Vec::new(),
        }
    }
}

impl<C: Tag> HealthReport<C> {
    pub fn is_healthy(&self) -> bool {
        self.base.is_empty() && self.core.is_empty() && self.activity.is_empty()
    }

    pub fn verdict(&self) -> Verdict {
        if !self.base.is_empty() {
            Verdict::Critical
        } else if !self.core.is_empty() {
            Verdict::CoreFailure
        } else if !self.activity.is_empty() {
            Verdict::ActivityFailure
        } else {
            Verdict::Healthy
        }
    }

    /// Check names per bucket, for `health_error` payloads.
    pub fn failed_names(&self) -> FailedChecks {
        FailedChecks {
            base: self.base.iter().map(BaseCheck::as_str).collect(),
            core: self.core.iter().map(Tag::as_str).collect(),
            activity: self.activity.iter().map(Tag::as_str).collect(),
        }
    }
}

/// Wire form of a [`HealthReport`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedChecks {
    pub base: Vec<&'static str>,
    pub core: Vec<&'static str>,
    pub activity: Vec<&'static str>,
}

/// Runs all checks concurrently and collects the failing ones.
pub async fn evaluate<C: Tag>(
    base: &[HealthCheck<BaseCheck>],
    core: &[HealthCheck<C>],
    activity: &[HealthCheck<C>],
) -> HealthReport<C> {
    let (base_ok, core_ok, activity_ok) = futures::join!(
        join_all(base.iter().map(|c| c.execute())),
        join_all(core.iter().map(|c| c.execute())),
        join_all(activity.iter().map(|c| c.execute())),
    );

    HealthReport {
        base: failing(base, &base_ok),
        core: failing(core, &core_ok),
        activity: failing(activity, &activity_ok),
    }
}

fn failing<C: Copy>(checks: &[HealthCheck<C>], passed: &[bool]) -> Vec<C> {
    checks
        .iter()
        .zip(passed)
        .filter(|(_, ok)| !**ok)
        .map(|(c, _)| c.check_type())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Probe {
        LoggedIn,
        InVoice,
        Streaming,
    }

    impl Tag for Probe {
        const VARIANTS: &'static [Self] = &[Probe::LoggedIn, Probe::InVoice, Probe::Streaming];
        fn as_str(&self) -> &'static str {
            match self {
                Probe::LoggedIn => "is_logged_in",
                Probe::InVoice => "in_voice_channel",
                Probe::Streaming => "screen_sharing",
            }
        }
    }

    fn fixed<C: Copy>(tag: C, ok: bool) -> HealthCheck<C> {
        HealthCheck::new(tag, move || async move { ok })
    }

    fn report(base: Vec<BaseCheck>, core: Vec<Probe>, activity: Vec<Probe>) -> HealthReport<Probe> {
        HealthReport { base, core, activity }
    }

    #[test]
    fn test_verdict_ladder() {
        assert_eq!(report(vec![], vec![], vec![]).verdict(), Verdict::Healthy);
        assert_eq!(
            report(vec![], vec![], vec![Probe::InVoice]).verdict(),
            Verdict::ActivityFailure
        );
        assert_eq!(
            report(vec![], vec![Probe::LoggedIn], vec![Probe::InVoice]).verdict(),
            Verdict::CoreFailure
        );
        assert_eq!(
            report(vec![BaseCheck::Running], vec![Probe::LoggedIn], vec![Probe::InVoice]).verdict(),
            Verdict::Critical
        );
    }

    #[test]
    fn test_verdict_states() {
        assert_eq!(Verdict::Healthy.health_state(), HealthState::Healthy);
        assert_eq!(Verdict::ActivityFailure.health_state(), HealthState::Degraded);
        assert_eq!(Verdict::CoreFailure.health_state(), HealthState::Error);
        assert_eq!(Verdict::Critical.health_state(), HealthState::Error);
    }

    #[tokio::test]
    async fn test_evaluate_buckets_only_failures() {
        let base = vec![fixed(BaseCheck::Running, true), fixed(BaseCheck::Locatable, false)];
        let core = vec![fixed(Probe::LoggedIn, true)];
        let activity = vec![fixed(Probe::InVoice, false), fixed(Probe::Streaming, true)];

        let r = evaluate(&base, &core, &activity).await;
        assert_eq!(r.base, vec![BaseCheck::Locatable]);
        assert!(r.core.is_empty());
        assert_eq!(r.activity, vec![Probe::InVoice]);
        assert!(!r.is_healthy());
    }

    #[tokio::test]
    async fn test_evaluate_runs_every_check_even_after_failure() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counting = |tag: Probe, ok: bool| {
            let runs = Arc::clone(&runs);
            HealthCheck::new(tag, move || {
                let runs = Arc::clone(&runs);
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    ok
                }
            })
        };
        let core = vec![counting(Probe::LoggedIn, false)];
        let activity = vec![counting(Probe::InVoice, false), counting(Probe::Streaming, false)];

        let r = evaluate(&[fixed(BaseCheck::Running, false)], &core, &activity).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(r.verdict(), Verdict::Critical);
    }

    #[tokio::test]
    async fn test_empty_plan_is_healthy() {
        let r = evaluate::<Probe>(&[], &[], &[]).await;
        assert!(r.is_healthy());
        assert_eq!(r.verdict(), Verdict::Healthy);
    }

    #[test]
    fn test_failed_names_use_wire_tags() {
        let names = report(vec![BaseCheck::Interactable], vec![], vec![Probe::Streaming]).failed_names();
        assert_eq!(names.base, vec!["interactable"]);
        assert!(names.core.is_empty());
        assert_eq!(names.activity, vec!["screen_sharing"]);
    }
}
