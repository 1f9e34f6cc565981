//! # LogWriter: envelope logger
//!
//! A minimal [`Subscribe`] that writes every envelope to `tracing` under the
//! `appvisor::broadcast` target. Handy for demos and for a transport-less
//! deployment.
//!
//! ## Example output
//! ```text
//! INFO appvisor::broadcast: task_create app="discord" task="learn_servers" status="pending"
//! INFO appvisor::broadcast: task_error app="discord" task="learn_servers" error="bad state"
//! WARN appvisor::broadcast: health_error app="discord" payload={"activity":null,"health_state":"error",...}
//! INFO appvisor::broadcast: app_launch app="discord" payload={"launched":true}
//! ```

use async_trait::async_trait;
use tracing::{info, warn};

use crate::broadcast::message::{Envelope, MessageType};
use crate::broadcast::subscribe::Subscribe;

/// Envelope writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_message(&self, e: &Envelope) {
        let field = |k: &str| e.payload.get(k).and_then(|v| v.as_str()).unwrap_or("-").to_owned();

        match e.message_type {
            MessageType::TaskCreate | MessageType::TaskRunning | MessageType::TaskFinish => {
                info!(
                    target: "appvisor::broadcast",
                    app = %e.app,
                    task = %field("task_type"),
                    id = %field("id"),
                    status = %field("status"),
                    "{}", e.message_type
                );
            }
            MessageType::TaskError => {
                warn!(
                    target: "appvisor::broadcast",
                    app = %e.app,
                    task = %field("task_type"),
                    id = %field("id"),
                    error = %field("error"),
                    "{}", e.message_type
                );
            }
            MessageType::HealthError => {
                warn!(target: "appvisor::broadcast", app = %e.app, payload = %e.payload, "{}", e.message_type);
            }
            MessageType::HealthUpdate
            | MessageType::ActivityStart
            | MessageType::ActivityEnd
            | MessageType::AppLaunch
            | MessageType::AppTerminate
            | MessageType::AppResponse => {
                info!(target: "appvisor::broadcast", app = %e.app, payload = %e.payload, "{}", e.message_type);
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
