//! # Controller: lifecycle, submission and queries.
//!
//! One controller supervises one [`ManagedApp`](crate::ManagedApp). While
//! running it owns one *generation* of two loops, plus a supervisor loop
//! that outlives generations:
//!
//! ```text
//!  submit_task ──► validate ──► tasks table ──► task_create ──► [FIFO of ids]
//!                                                                   │
//!  ┌──────────────────────────── generation (CancellationToken) ────┼──────────┐
//!  │  processor loop:  recv id ─► Running ─► executor ─► Completed/Failed      │
//!  │  heartbeat loop:  sleep ─► run_heartbeat_cycle ─► state + broadcasts      │
//!  └──────────────────────────────────────────┬────────────────────────────────┘
//!                                             │ try_send(Critical)
//!                                             ▼
//!                                    [failure channel]
//!                                             │
//!                supervisor loop (once per controller, Weak<Controller>)
//!                       stop() ─► backoff ─► start()
//! ```
//!
//! ## Rules
//! - `start`/`stop` are serialized by the `lifecycle` mutex; a generation is
//!   fully drained before the next one is spawned.
//! - The queue receiver outlives generations: ids submitted while stopped are
//!   processed after the next `start`.
//! - Locks on `tasks`, `health` and the activity slot are never held across
//!   an executor, probe, handler or broadcast await.
//! - The supervisor is spawned on the first successful `start` and ends with
//!   `shutdown()` or when the controller is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::activity::{Activity, ActivityHandle};
use crate::app::{AppKind, ManagedApp, Tag};
use crate::broadcast::{Broadcaster, HealthPayload, LifecyclePayload, MessageType, Notifier};
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::health::{BaseCheck, HealthCheck, HealthFailure, HealthReport, HealthState, base_checks};
use crate::tasks::{Params, Task, TaskId, TaskStatus};

use super::builder::ControllerBuilder;
use super::registry::Registry;

/// Handles of one running generation.
struct Generation {
    token: CancellationToken,
    heartbeat: JoinHandle<()>,
    processor: JoinHandle<()>,
}

/// Supervisor of one application instance.
pub struct Controller<K: AppKind> {
    pub(super) name: String,
    pub(super) app: Arc<K::App>,
    pub(super) config: ControllerConfig,
    pub(super) registry: Registry<K>,
    pub(super) base_checks: Vec<HealthCheck<BaseCheck>>,
    pub(super) notifier: Notifier,

    pub(super) tasks: RwLock<HashMap<TaskId, Task<K::TaskType>>>,
    queue_tx: mpsc::UnboundedSender<TaskId>,
    pub(super) queue_rx: Mutex<mpsc::UnboundedReceiver<TaskId>>,

    health: RwLock<HealthState>,
    pub(super) activity: ActivityHandle<K>,

    running: AtomicBool,
    lifecycle: Mutex<Option<Generation>>,

    pub(super) failure_tx: mpsc::Sender<HealthFailure>,
    failure_rx: Mutex<Option<mpsc::Receiver<HealthFailure>>>,
    pub(super) restarts: AtomicU32,
    pub(super) shutdown: CancellationToken,
}

impl<K: AppKind> Controller<K> {
    /// Starts a builder for `app`, broadcasting through `broadcaster`.
    pub fn builder(app: Arc<K::App>, broadcaster: Arc<dyn Broadcaster>) -> ControllerBuilder<K> {
        ControllerBuilder::new(app, broadcaster)
    }

    pub(super) fn new_internal(
        app: Arc<K::App>,
        broadcaster: Arc<dyn Broadcaster>,
        config: ControllerConfig,
        registry: Registry<K>,
    ) -> Arc<Self> {
        let name = app.name().to_string();
        let notifier = Notifier::new(&name, broadcaster);
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (failure_tx, failure_rx) = mpsc::channel(config.failure_capacity_clamped());

        Arc::new(Self {
            base_checks: base_checks(&app),
            activity: ActivityHandle::new(notifier.clone()),
            name,
            app,
            config,
            registry,
            notifier,
            tasks: RwLock::new(HashMap::new()),
            queue_tx,
            queue_rx: Mutex::new(queue_rx),
            health: RwLock::new(HealthState::Uninitialised),
            running: AtomicBool::new(false),
            lifecycle: Mutex::new(None),
            failure_tx,
            failure_rx: Mutex::new(Some(failure_rx)),
            restarts: AtomicU32::new(0),
            shutdown: CancellationToken::new(),
        })
    }

    /// Launches the application and spawns the heartbeat and processor loops.
    ///
    /// The first successful call also spawns the failure supervisor.
    #[instrument(level = "info", skip(self), fields(app = %self.name))]
    pub async fn start(self: &Arc<Self>) -> Result<(), ControllerError> {
        self.start_generation().await?;

        if let Some(rx) = self.failure_rx.lock().await.take() {
            self.spawn_supervisor(rx);
        }
        Ok(())
    }

    /// `start()` minus the supervisor; the supervisor restarts through here.
    pub(super) async fn start_generation(self: &Arc<Self>) -> Result<(), ControllerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if self.shutdown.is_cancelled() {
            return Err(ControllerError::ShutDown);
        }
        if lifecycle.is_some() {
            return Err(ControllerError::AlreadyRunning);
        }

        self.set_health(HealthState::Starting).await;
        self.send_health(MessageType::HealthUpdate, None).await;

        let launched = self.app.launch().await;
        if !launched {
            warn!("launch reported failure; the heartbeat will escalate if the app stays down");
        }
        self.notifier
            .send(MessageType::AppLaunch, &LifecyclePayload::Launched(launched))
            .await;

        let token = self.shutdown.child_token();
        let heartbeat = tokio::spawn(Arc::clone(self).heartbeat_loop(token.clone()));
        let processor = tokio::spawn(Arc::clone(self).processor_loop(token.clone()));
        *lifecycle = Some(Generation {
            token,
            heartbeat,
            processor,
        });
        self.running.store(true, Ordering::SeqCst);

        info!(launched, "controller started");
        Ok(())
    }

    /// Cancels the running generation, waits for it, then terminates the application.
    #[instrument(level = "info", skip(self), fields(app = %self.name))]
    pub async fn stop(&self) -> Result<(), ControllerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        let generation = lifecycle.take().ok_or(ControllerError::NotRunning)?;

        self.running.store(false, Ordering::SeqCst);
        generation.token.cancel();
        self.drain(generation).await;

        let terminated = self.app.terminate().await;
        if !terminated {
            warn!("terminate reported failure");
        }
        self.notifier
            .send(MessageType::AppTerminate, &LifecyclePayload::Terminated(terminated))
            .await;

        self.set_health(HealthState::Stopped).await;
        self.send_health(MessageType::HealthUpdate, None).await;

        info!(terminated, "controller stopped");
        Ok(())
    }

    /// Ends the supervisor and stops the controller if it is running.
    ///
    /// Afterwards `start()` fails with [`ControllerError::ShutDown`]. Idempotent.
    #[instrument(level = "info", skip(self), fields(app = %self.name))]
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        match self.stop().await {
            Ok(()) | Err(ControllerError::NotRunning) => {}
            Err(e) => warn!(error = %e, label = e.as_label(), "stop during shutdown failed"),
        }
    }

    /// Joins both loops, each bounded by `stop_grace`; stragglers are aborted.
    async fn drain(&self, generation: Generation) {
        let grace = self.config.stop_grace;
        let loops = [
            ("heartbeat", generation.heartbeat),
            ("processor", generation.processor),
        ];

        for (name, mut handle) in loops {
            match tokio::time::timeout(grace, &mut handle).await {
                Ok(Ok(())) => debug!(task = name, "loop stopped"),
                Ok(Err(e)) => error!(task = name, error = %e, "loop ended abnormally"),
                Err(_) => {
                    warn!(task = name, ?grace, "loop exceeded stop grace; aborting");
                    handle.abort();
                    if let Err(e) = handle.await {
                        if !e.is_cancelled() {
                            error!(task = name, error = %e, "aborted loop ended abnormally");
                        }
                    }
                }
            }
        }
    }

    /// Validates, records and enqueues a task.
    ///
    /// Works whether or not the controller is running.
    #[instrument(level = "debug", skip(self, task_type, params), fields(app = %self.name, task_type = task_type.as_str()))]
    pub async fn submit_task(
        &self,
        task_type: K::TaskType,
        params: Params,
    ) -> Result<TaskId, ControllerError> {
        self.registry.validate(task_type, &params)?;

        let task = Task::new(task_type, params);
        let id = task.id();
        let view = task.view();
        self.tasks.write().await.insert(id, task);

        self.notifier.send(MessageType::TaskCreate, &view).await;
        // The receiver lives in `self`, so the queue cannot be closed here.
        let _ = self.queue_tx.send(id);

        debug!(%id, "task queued");
        Ok(id)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn app(&self) -> &Arc<K::App> {
        &self.app
    }

    /// True between a successful `start()` and the next `stop()`.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn health(&self) -> HealthState {
        *self.health.read().await
    }

    /// Snapshot of the current activity.
    pub async fn activity(&self) -> Option<Activity<K::ActivityType>> {
        self.activity.current().await
    }

    /// Handle to the activity slot, for transports that start or end activities directly.
    pub fn activity_handle(&self) -> ActivityHandle<K> {
        self.activity.clone()
    }

    /// Snapshot of one task.
    pub async fn task(&self, id: TaskId) -> Option<Task<K::TaskType>> {
        self.tasks.read().await.get(&id).cloned()
    }

    /// Snapshot of every task, oldest first.
    pub async fn tasks(&self) -> Vec<Task<K::TaskType>> {
        let mut all: Vec<_> = self.tasks.read().await.values().cloned().collect();
        all.sort_by_key(|t| t.created_at());
        all
    }

    /// Snapshot of the tasks in `status`, oldest first.
    pub async fn tasks_with_status(&self, status: TaskStatus) -> Vec<Task<K::TaskType>> {
        let mut some: Vec<_> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.status() == status)
            .cloned()
            .collect();
        some.sort_by_key(|t| t.created_at());
        some
    }

    pub(super) async fn set_health(&self, state: HealthState) {
        let prev = std::mem::replace(&mut *self.health.write().await, state);
        if prev != state {
            debug!(from = %prev, to = %state, "health changed");
        }
    }

    /// Emits `health_update` / `health_error` with the current activity and state.
    pub(super) async fn send_health(
        &self,
        message_type: MessageType,
        report: Option<&HealthReport<K::CheckType>>,
    ) {
        let payload = HealthPayload {
            activity: self.activity.current().await.map(|a| a.view()),
            health_state: self.health().await,
            failed: report.map(HealthReport::failed_names),
        };
        self.notifier.send(message_type, &payload).await;
    }

    pub(super) fn handler_context(&self) -> super::handler::HandlerContext<K> {
        super::handler::HandlerContext {
            app: Arc::clone(&self.app),
            activity: self.activity.clone(),
        }
    }
}

impl<K: AppKind> Drop for Controller<K> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
