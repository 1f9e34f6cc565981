//! # Broadcast envelope.
//!
//! Every state change leaves the controller as one [`Envelope`]:
//!
//! ```json
//! { "app": "discord", "message_type": "task_finish", "payload": { ... } }
//! ```
//!
//! | `message_type`    | payload                                         |
//! |-------------------|-------------------------------------------------|
//! | `task_create`     | [`TaskView`](crate::TaskView)                   |
//! | `task_running`    | [`TaskView`](crate::TaskView)                   |
//! | `task_finish`     | [`TaskView`](crate::TaskView)                   |
//! | `task_error`      | [`TaskView`](crate::TaskView)                   |
//! | `health_update`   | [`HealthPayload`]                               |
//! | `health_error`    | [`HealthPayload`] with `failed`                 |
//! | `activity_start`  | [`ActivityView`](crate::ActivityView)           |
//! | `activity_end`    | [`ActivityView`](crate::ActivityView)           |
//! | `app_launch`      | [`LifecyclePayload`] (`launched`)               |
//! | `app_terminate`   | [`LifecyclePayload`] (`terminated`)             |
//! | `app_response`    | [`AppResponse`](crate::AppResponse)             |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::activity::ActivityView;
use crate::health::{FailedChecks, HealthState};

/// Kind of a broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    TaskCreate,
    TaskRunning,
    TaskFinish,
    TaskError,
    HealthUpdate,
    HealthError,
    ActivityStart,
    ActivityEnd,
    AppLaunch,
    AppTerminate,
    AppResponse,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::TaskCreate => "task_create",
            MessageType::TaskRunning => "task_running",
            MessageType::TaskFinish => "task_finish",
            MessageType::TaskError => "task_error",
            MessageType::HealthUpdate => "health_update",
            MessageType::HealthError => "health_error",
            MessageType::ActivityStart => "activity_start",
            MessageType::ActivityEnd => "activity_end",
            MessageType::AppLaunch => "app_launch",
            MessageType::AppTerminate => "app_terminate",
            MessageType::AppResponse => "app_response",
        }
    }

    /// Task notifications (`task_*`).
    pub fn is_task(&self) -> bool {
        matches!(
            self,
            MessageType::TaskCreate
                | MessageType::TaskRunning
                | MessageType::TaskFinish
                | MessageType::TaskError
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// [`ManagedApp::name`](crate::ManagedApp::name) of the emitting controller.
    pub app: String,
    pub message_type: MessageType,
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn new(app: impl Into<String>, message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            app: app.into(),
            message_type,
            payload,
        }
    }

    /// JSON text of the envelope.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// `payload.id` for task notifications.
    pub fn task_id(&self) -> Option<&str> {
        if !self.message_type.is_task() {
            return None;
        }
        self.payload.get("id")?.as_str()
    }
}

/// Payload of `health_update` and `health_error`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HealthPayload {
    pub activity: Option<ActivityView>,
    pub health_state: HealthState,
    /// Failing checks; present on `health_error` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<FailedChecks>,
}

/// Payload of `app_launch` and `app_terminate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePayload {
    Launched(bool),
    Terminated(bool),
}
