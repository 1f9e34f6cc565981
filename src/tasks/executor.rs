//! # Executors: the code that runs a task.
//!
//! An executor is registered per task type on the
//! [`ControllerBuilder`](crate::ControllerBuilder). It receives a
//! [`TaskContext`] and the task's params, and returns either an optional
//! [`AppResponse`] (broadcast verbatim as `app_response`) or a
//! [`TaskFailure`].
//!
//! [`ExecutorFn`] wraps a closure producing a fresh future per call, so most
//! executors never implement [`Executor`] by hand:
//!
//! ```rust,ignore
//! builder.executor(ChatTask::LearnServers, |ctx: TaskContext<Chat>, _params| async move {
//!     let servers = ctx.app.list_servers().await.map_err(TaskFailure::execution)?;
//!     Ok(Some(AppResponse::new("learn_servers", json!({ "servers": servers }))))
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::activity::ActivityHandle;
use crate::app::{AppKind, Tag};
use crate::error::TaskFailure;
use crate::tasks::task::{Params, TaskId};

/// What an executor returns.
pub type ExecResult = Result<Option<AppResponse>, TaskFailure>;

/// Shared handle to an executor.
pub type ExecutorRef<K> = Arc<dyn Executor<K>>;

/// A result an executor wants pushed to subscribers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppResponse {
    /// Discriminator chosen by the executor, usually the task type tag.
    pub response_kind: String,
    /// Arbitrary payload.
    pub body: serde_json::Value,
}

impl AppResponse {
    pub fn new(response_kind: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            response_kind: response_kind.into(),
            body,
        }
    }

    /// Response tagged with a task type.
    pub fn for_task<T: Tag>(task_type: T, body: serde_json::Value) -> Self {
        Self::new(task_type.as_str(), body)
    }
}

/// What an executor can reach while it runs.
pub struct TaskContext<K: AppKind> {
    /// The application driver.
    pub app: Arc<K::App>,
    /// Id of the task being executed; the natural initiator of activities it starts.
    pub task_id: TaskId,
    /// The controller's activity slot.
    pub activity: ActivityHandle<K>,
}

impl<K: AppKind> Clone for TaskContext<K> {
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            task_id: self.task_id,
            activity: self.activity.clone(),
        }
    }
}

/// Runs one task type.
#[async_trait]
pub trait Executor<K: AppKind>: Send + Sync + 'static {
    async fn execute(&self, ctx: TaskContext<K>, params: Params) -> ExecResult;
}

/// Closure-backed [`Executor`].
#[derive(Debug)]
pub struct ExecutorFn<F> {
    f: F,
}

impl<F> ExecutorFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps the closure as an [`ExecutorRef`].
    pub fn arc<K>(f: F) -> ExecutorRef<K>
    where
        K: AppKind,
        Self: Executor<K>,
    {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<K, F, Fut> Executor<K> for ExecutorFn<F>
where
    K: AppKind,
    F: Fn(TaskContext<K>, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ExecResult> + Send + 'static,
{
    async fn execute(&self, ctx: TaskContext<K>, params: Params) -> ExecResult {
        (self.f)(ctx, params).await
    }
}
