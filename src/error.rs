//! Error types used by the controller and by task executors.
//!
//! - [`ControllerError`] errors returned synchronously by the controller API
//!   (submission, lifecycle, activity slot, configuration).
//! - [`TaskFailure`] the outcome of a task that did not complete; recorded in
//!   the task and surfaced through `task_error` broadcasts only.
//!
//! Both provide `as_label` for logs.

use std::any::Any;

use thiserror::Error;

/// # Errors produced by the controller API.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// Submission rejected: no validator for the task type, or the validator refused the params.
    #[error("task '{task_type}' rejected: {reason}")]
    Validation {
        /// Tag of the rejected task type.
        task_type: &'static str,
        /// Validator message.
        reason: String,
    },

    /// Registration tables are inconsistent (e.g. an activity type without checks).
    #[error("configuration error: {reason}")]
    Configuration {
        /// What is missing or duplicated.
        reason: String,
    },

    /// `start()` called while the controller is running.
    #[error("controller is already running")]
    AlreadyRunning,

    /// `stop()` called while the controller is not running.
    #[error("controller is not running")]
    NotRunning,

    /// `start()` called after `shutdown()`.
    #[error("controller has been shut down")]
    ShutDown,

    /// An activity was started while another one is current.
    #[error("activity '{current}' is already in progress")]
    ActivityInProgress {
        /// Tag of the current activity.
        current: &'static str,
    },

    /// An activity was ended while none is current.
    #[error("no activity in progress")]
    NoActivity,
}

impl ControllerError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use appvisor::ControllerError;
    ///
    /// assert_eq!(ControllerError::NotRunning.as_label(), "controller_not_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ControllerError::Validation { .. } => "task_rejected",
            ControllerError::Configuration { .. } => "controller_misconfigured",
            ControllerError::AlreadyRunning => "controller_already_running",
            ControllerError::NotRunning => "controller_not_running",
            ControllerError::ShutDown => "controller_shut_down",
            ControllerError::ActivityInProgress { .. } => "activity_in_progress",
            ControllerError::NoActivity => "activity_missing",
        }
    }
}

/// # Why a task ended in `Failed`.
///
/// The `Display` form is what ends up in [`Task::error`](crate::Task::error),
/// so [`TaskFailure::Execution`] renders the executor's message verbatim.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    /// No executor registered for the task type.
    #[error("no executor registered for task type '{task_type}'")]
    Unroutable {
        /// Tag of the unroutable task type.
        task_type: &'static str,
    },

    /// The executor returned an error or panicked.
    #[error("{error}")]
    Execution {
        /// The underlying error message.
        error: String,
    },

    /// The executor was interrupted by `stop()`.
    #[error("cancelled before completion")]
    Cancelled,
}

impl TaskFailure {
    /// Shorthand for [`TaskFailure::Execution`].
    ///
    /// ```
    /// use appvisor::TaskFailure;
    ///
    /// let err = TaskFailure::execution("bad state");
    /// assert_eq!(err.to_string(), "bad state");
    /// ```
    pub fn execution(error: impl std::fmt::Display) -> Self {
        TaskFailure::Execution {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskFailure::Unroutable { .. } => "task_unroutable",
            TaskFailure::Execution { .. } => "task_failed",
            TaskFailure::Cancelled => "task_cancelled",
        }
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
