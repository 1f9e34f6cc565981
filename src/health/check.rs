//! # Health checks.
//!
//! A [`HealthCheck`] pairs a tag with an async probe returning `bool`.
//! Probes are evaluated under `catch_unwind`; a panicking probe counts as a
//! failing check and never takes the heartbeat down.
//!
//! Three families feed a heartbeat cycle:
//! - base checks, built by the controller from [`ManagedApp`] (see [`BaseCheck`]);
//! - application-core checks, registered once per application kind;
//! - activity checks, registered per activity type and evaluated only while
//!   that activity is current.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::app::ManagedApp;

type Probe = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

/// Checks every application gets for free.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BaseCheck {
    /// [`ManagedApp::is_running`].
    Running,
    /// [`ManagedApp::is_interactable`].
    Interactable,
    /// [`ManagedApp::is_locatable`].
    Locatable,
}

impl BaseCheck {
    pub const ALL: [BaseCheck; 3] = [BaseCheck::Running, BaseCheck::Interactable, BaseCheck::Locatable];

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseCheck::Running => "running",
            BaseCheck::Interactable => "interactable",
            BaseCheck::Locatable => "locatable",
        }
    }
}

/// A tagged async probe.
pub struct HealthCheck<C> {
    check_type: C,
    probe: Probe,
}

impl<C: Clone> Clone for HealthCheck<C> {
    fn clone(&self) -> Self {
        Self {
            check_type: self.check_type.clone(),
            probe: Arc::clone(&self.probe),
        }
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for HealthCheck<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthCheck")
            .field("check_type", &self.check_type)
            .finish_non_exhaustive()
    }
}

impl<C: Copy> HealthCheck<C> {
    /// Wraps a probe factory; each evaluation calls it for a fresh future.
    pub fn new<F, Fut>(check_type: C, probe: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self {
            check_type,
            probe: Arc::new(move || probe().boxed()),
        }
    }

    pub fn check_type(&self) -> C {
        self.check_type
    }

    /// Runs the probe. A panic is reported as `false`.
    pub async fn execute(&self) -> bool {
        AssertUnwindSafe((self.probe)())
            .catch_unwind()
            .await
            .unwrap_or(false)
    }
}

/// The three base checks bound to `app`.
pub(crate) fn base_checks<A: ManagedApp>(app: &Arc<A>) -> Vec<HealthCheck<BaseCheck>> {
    BaseCheck::ALL
        .into_iter()
        .map(|kind| {
            let app = Arc::clone(app);
            HealthCheck::new(kind, move || {
                let app = Arc::clone(&app);
                async move {
                    match kind {
                        BaseCheck::Running => app.is_running().await,
                        BaseCheck::Interactable => app.is_interactable().await,
                        BaseCheck::Locatable => app.is_locatable().await,
                    }
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_probe_result_is_returned() {
        let ok = HealthCheck::new("ok", || async { true });
        let bad = HealthCheck::new("bad", || async { false });
        assert!(ok.execute().await);
        assert!(!bad.execute().await);
        assert_eq!(bad.check_type(), "bad");
    }

    #[tokio::test]
    async fn test_panicking_probe_counts_as_failure() {
        let check = HealthCheck::new("boom", || async {
            panic!("probe exploded");
        });
        assert!(!check.execute().await);
    }

    #[tokio::test]
    async fn test_each_execution_polls_a_fresh_future() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let check = HealthCheck::new("count", move || {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                true
            }
        });
        check.execute().await;
        check.clone().execute().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
