//! # appvisor
//!
//! **appvisor** supervises one externally-managed application (a desktop
//! client, a browser session) on behalf of remote clients. It accepts work
//! requests, runs them one at a time against the application, keeps checking
//! that the application is alive and usable, restarts it when it is not, and
//! pushes every state change to subscribers.
//!
//! ## Architecture
//! ```text
//!            submit_task(type, params)                      ManagedApp driver
//!                     │                                   (launch / terminate /
//!                     ▼                                    probes / domain actions)
//! ┌──────────────────────────────────────────────────────────────┐      ▲
//! │ Controller                                                   │      │
//! │  - Registry (validators, executors, checks, handlers)        │      │
//! │  - tasks table + FIFO of ids                                 │──────┘
//! │  - HealthState, activity slot                                │
//! └──────┬──────────────────────┬───────────────────────┬────────┘
//!        ▼                      ▼                       ▼
//!  ┌────────────┐        ┌────────────┐          ┌────────────┐
//!  │ processor  │        │ heartbeat  │─Critical─►│ supervisor │
//!  │ (one task  │        │ (checks    │          │ stop ─►    │
//!  │  at a time)│        │  every 5s) │          │ backoff ─► │
//!  └─────┬──────┘        └─────┬──────┘          │ start      │
//!        │                     │                 └─────┬──────┘
//!        ▼                     ▼                       ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Broadcaster::broadcast(Envelope { app, message_type, payload })│
//! └──────────────────────────────┬───────────────────────────────┘
//!                                ▼
//!                  SubscriberSet ─► worker per Subscribe
//! ```
//!
//! ### Task lifecycle
//! ```text
//! submit ─► validator ─┬─ Err ─► ControllerError::Validation (nothing stored)
//!                      └─ Ok  ─► Pending, task_create, enqueue
//! dequeue ─► Running, task_running
//!         ─► executor ─┬─ Ok(Some(r)) ─► app_response(r), Completed, task_finish
//!                      ├─ Ok(None)    ─► Completed, task_finish
//!                      └─ Err / panic / no executor / stop ─► Failed, task_error
//! ```
//!
//! ### Health escalation
//! ```text
//! base check failed      ─► Error,    health_error, Critical ─► supervisor restart
//! core check failed      ─► Error,    health_error, on_core_failure(failed core checks)
//! activity check failed  ─► Degraded, health_error, on_activity_failure(failed activity checks)
//! nothing failed         ─► Healthy
//! every cycle            ─► health_update
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Contract**      | What the controller needs from the application.          | [`ManagedApp`], [`AppKind`], [`Tag`]         |
//! | **Tasks**         | Submission, validation, serialized execution.            | [`Task`], [`Executor`], [`ExecutorFn`]       |
//! | **Health**        | Base, core and activity-scoped checks.                   | [`HealthCheck`], [`HealthState`]             |
//! | **Activities**    | One current engagement widening the health checks.       | [`Activity`], [`ActivityHandle`]             |
//! | **Broadcast**     | Typed notifications and a reference fan-out.             | [`Envelope`], [`Broadcaster`], [`Subscribe`] |
//! | **Restarts**      | Backoff between self-healing restarts.                   | [`BackoffPolicy`], [`JitterPolicy`]          |
//! | **Errors**        | Typed errors with stable labels.                         | [`ControllerError`], [`TaskFailure`]         |
//! | **Configuration** | Timings, from code or environment.                       | [`ControllerConfig`]                         |
//! | **Logging**       | `tracing` subscriber setup (text / JSON).                | [`LoggerConfig`], [`logger_init`]            |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber that writes every envelope to `tracing`.

mod activity;
mod app;
mod broadcast;
mod config;
mod controller;
mod error;
mod health;
mod observe;
mod policies;
mod signals;
mod tasks;

// ---- Public re-exports ----

pub use activity::{Activity, ActivityHandle, ActivityView};
pub use app::{AppKind, ManagedApp, Tag};
pub use broadcast::{
    Broadcaster, Envelope, HealthPayload, LifecyclePayload, MessageType, Subscribe, SubscriberSet,
};
pub use config::{
    ConfigError, ControllerConfig, ENV_FAILURE_CAPACITY, ENV_HEARTBEAT_INTERVAL_MS,
    ENV_STOP_GRACE_MS,
};
pub use controller::{
    Controller, ControllerBuilder, FailureHandler, HandlerContext, HandlerFn, HandlerRef,
};
pub use error::{ControllerError, TaskFailure};
pub use health::{
    BaseCheck, FailedChecks, HealthCheck, HealthFailure, HealthReport, HealthState, Verdict,
    evaluate,
};
pub use observe::{LoggerConfig, LoggerError, LoggerFormat, logger_init};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use signals::wait_for_shutdown_signal;
pub use tasks::{
    AppResponse, ExecResult, Executor, ExecutorFn, ExecutorRef, InvalidTransition, Params, Task,
    TaskContext, TaskId, TaskStatus, TaskView, Validator, validators,
};

#[cfg(feature = "logging")]
pub use broadcast::LogWriter;
