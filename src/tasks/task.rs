//! # Task record and status machine.
//!
//! ```text
//! Pending ──► Running ──┬──► Completed
//!                       └──► Failed
//! ```
//!
//! ## Rules
//! - Transitions are monotonic; anything else is an [`InvalidTransition`].
//! - `started_at` is stamped on entering `Running`, `finished_at` on entering a terminal state.
//! - Only the processor loop mutates a task after submission.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::Tag;

/// Task parameters: a string-keyed JSON object.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Unique task identifier (UUID v4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Task status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Queued.
    Pending,
    /// Executing.
    Running,
    /// Executor returned `Ok`.
    Completed,
    /// Unroutable, executor error, panic or cancellation.
    Failed,
}

impl TaskStatus {
    /// Snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// `Completed` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether `self → next` is allowed.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Running, TaskStatus::Completed)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status change.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid task transition {from} -> {to}")]
pub struct InvalidTransition {
    /// Current status.
    pub from: TaskStatus,
    /// Requested status.
    pub to: TaskStatus,
}

/// A unit of work submitted to the controller.
#[derive(Clone, Debug)]
pub struct Task<T: Tag> {
    id: TaskId,
    task_type: T,
    params: Params,
    status: TaskStatus,
    created_at: OffsetDateTime,
    started_at: Option<OffsetDateTime>,
    finished_at: Option<OffsetDateTime>,
    error: Option<String>,
}

impl<T: Tag> Task<T> {
    /// New `Pending` task with a fresh id.
    pub fn new(task_type: T, params: Params) -> Self {
        Self {
            id: TaskId::new(),
            task_type,
            params,
            status: TaskStatus::Pending,
            created_at: OffsetDateTime::now_utc(),
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn task_type(&self) -> T {
        self.task_type
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn started_at(&self) -> Option<OffsetDateTime> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<OffsetDateTime> {
        self.finished_at
    }

    /// Failure message, set only when `Failed`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `finished_at - started_at`, when both are known.
    pub fn duration(&self) -> Option<time::Duration> {
        Some(self.finished_at? - self.started_at?)
    }

    pub(crate) fn mark_running(&mut self) -> Result<(), InvalidTransition> {
        self.transition(TaskStatus::Running)?;
        self.started_at = Some(OffsetDateTime::now_utc());
        Ok(())
    }

    pub(crate) fn mark_completed(&mut self) -> Result<(), InvalidTransition> {
        self.transition(TaskStatus::Completed)?;
        self.finished_at = Some(OffsetDateTime::now_utc());
        Ok(())
    }

    pub(crate) fn mark_failed(&mut self, error: String) -> Result<(), InvalidTransition> {
        self.transition(TaskStatus::Failed)?;
        self.finished_at = Some(OffsetDateTime::now_utc());
        self.error = Some(error);
        Ok(())
    }

    fn transition(&mut self, to: TaskStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(to) {
            return Err(InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Serializable projection used in task broadcasts.
    pub fn view(&self) -> TaskView {
        TaskView {
            id: self.id,
            task_type: self.task_type.as_str().to_string(),
            status: self.status,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            duration: self.duration().map(|d| d.as_seconds_f64()),
            error: self.error.clone(),
        }
    }
}

/// Wire projection of a [`Task`]; timestamps are RFC 3339, `duration` is in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: TaskId,
    pub task_type: String,
    pub status: TaskStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub finished_at: Option<OffsetDateTime>,
    pub duration: Option<f64>,
    pub error: Option<String>,
}
