//! # Failure handlers
//!
//! Called by the heartbeat when application-core checks (`on_core_failure`)
//! or activity checks (`on_activity_failure`) fail and no base check did.
//! A handler receives exactly the failing checks of its bucket. Typical
//! handlers re-login, or end the activity that can no longer be sustained.
//!
//! A panicking handler is caught by the heartbeat and moves the controller
//! to `Error`.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::activity::ActivityHandle;
use crate::app::{AppKind, Tag};

/// Shared handle to a failure handler.
pub type HandlerRef<K> = Arc<dyn FailureHandler<K>>;

/// What a failure handler can reach.
pub struct HandlerContext<K: AppKind> {
    pub app: Arc<K::App>,
    pub activity: ActivityHandle<K>,
}

impl<K: AppKind> Clone for HandlerContext<K> {
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            activity: self.activity.clone(),
        }
    }
}

/// Reaction to a non-critical health failure.
#[async_trait]
pub trait FailureHandler<K: AppKind>: Send + Sync + 'static {
    async fn on_failure(&self, ctx: HandlerContext<K>, failed: Vec<K::CheckType>);
}

/// Closure-backed [`FailureHandler`].
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }

    pub fn arc<K>(f: F) -> HandlerRef<K>
    where
        K: AppKind,
        Self: FailureHandler<K>,
    {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<K, F, Fut> FailureHandler<K> for HandlerFn<F>
where
    K: AppKind,
    F: Fn(HandlerContext<K>, Vec<K::CheckType>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_failure(&self, ctx: HandlerContext<K>, failed: Vec<K::CheckType>) {
        (self.f)(ctx, failed).await
    }
}

/// Default handler: logs the failing checks and does nothing else.
pub struct LogFailures {
    pub(crate) bucket: &'static str,
}

#[async_trait]
impl<K: AppKind> FailureHandler<K> for LogFailures {
    async fn on_failure(&self, _ctx: HandlerContext<K>, failed: Vec<K::CheckType>) {
        let names: Vec<&str> = failed.iter().map(Tag::as_str).collect();
        warn!(bucket = self.bucket, failed = ?names, "health checks failing; no handler registered");
    }
}
