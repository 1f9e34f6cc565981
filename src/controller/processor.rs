//! Processor loop: executes queued tasks one at a time, in submission order.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::app::{AppKind, Tag};
use crate::broadcast::MessageType;
use crate::error::{TaskFailure, panic_message};
use crate::tasks::{ExecResult, Params, TaskContext, TaskId, TaskStatus, TaskView};

use super::core::Controller;

impl<K: AppKind> Controller<K> {
    /// Holds the queue receiver for the lifetime of the generation.
    pub(super) async fn processor_loop(self: Arc<Self>, token: CancellationToken) {
        let mut queue = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            guard = self.queue_rx.lock() => guard,
        };

        loop {
            let id = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                next = queue.recv() => match next {
                    Some(id) => id,
                    None => break,
                },
            };
            if let Err(panic) = AssertUnwindSafe(self.process(id, &token)).catch_unwind().await {
                let reason = panic_message(&*panic);
                error!(%id, %reason, "task processing panicked");
                self.recover(id, reason).await;
            }
        }
        debug!(app = %self.name, "processor loop exited");
    }

    async fn process(&self, id: TaskId, token: &CancellationToken) {
        let Some((task_type, params)) = self.begin(id).await else {
            return;
        };

        let Some(executor) = self.registry.executor(task_type) else {
            self.fail(
                id,
                TaskFailure::Unroutable {
                    task_type: task_type.as_str(),
                },
            )
            .await;
            return;
        };

        let ctx = TaskContext {
            app: Arc::clone(&self.app),
            task_id: id,
            activity: self.activity.clone(),
        };
        let run = AssertUnwindSafe(executor.execute(ctx, params)).catch_unwind();

        let outcome: ExecResult = tokio::select! {
            biased;
            _ = token.cancelled() => Err(TaskFailure::Cancelled),
            res = run => match res {
                Ok(result) => result,
                Err(panic) => Err(TaskFailure::execution(panic_message(&*panic))),
            },
        };

        match outcome {
            Ok(response) => {
                if let Some(response) = response {
                    self.notifier.send(MessageType::AppResponse, &response).await;
                }
                self.complete(id).await;
            }
            Err(failure) => self.fail(id, failure).await,
        }
    }

    /// Fails a task left `Running` by a panic outside the executor.
    async fn recover(&self, id: TaskId, reason: String) {
        let still_running = matches!(
            self.tasks.read().await.get(&id).map(|t| t.status()),
            Some(TaskStatus::Running)
        );
        if !still_running {
            return;
        }
        let fail = AssertUnwindSafe(self.fail(id, TaskFailure::execution(reason))).catch_unwind();
        if let Err(panic) = fail.await {
            error!(%id, reason = %panic_message(&*panic), "failure notification panicked");
        }
    }

    /// `Pending → Running`; returns what the executor needs.
    async fn begin(&self, id: TaskId) -> Option<(K::TaskType, Params)> {
        let (task_type, params, view) = {
            let mut tasks = self.tasks.write().await;
            let Some(task) = tasks.get_mut(&id) else {
                error!(%id, "queued task missing from table");
                return None;
            };
            if let Err(e) = task.mark_running() {
                warn!(%id, error = %e, "skipping task");
                return None;
            }
            (task.task_type(), task.params().clone(), task.view())
        };

        debug!(%id, task_type = task_type.as_str(), "task running");
        self.notifier.send(MessageType::TaskRunning, &view).await;
        Some((task_type, params))
    }

    async fn complete(&self, id: TaskId) {
        let Some(view) = self.finish(id, |task| task.mark_completed()).await else {
            return;
        };
        debug!(%id, duration = ?view.duration, "task completed");
        self.notifier.send(MessageType::TaskFinish, &view).await;
    }

    async fn fail(&self, id: TaskId, failure: TaskFailure) {
        let message = failure.to_string();
        let Some(view) = self.finish(id, |task| task.mark_failed(message)).await else {
            return;
        };
        warn!(%id, task_type = %view.task_type, label = failure.as_label(), error = %failure, "task failed");
        self.notifier.send(MessageType::TaskError, &view).await;
    }

    async fn finish<F>(&self, id: TaskId, transition: F) -> Option<TaskView>
    where
        F: FnOnce(&mut crate::tasks::Task<K::TaskType>) -> Result<(), crate::tasks::InvalidTransition>,
    {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id)?;
        if let Err(e) = transition(task) {
            error!(%id, error = %e, "task transition rejected");
            return None;
        }
        Some(task.view())
    }
}
