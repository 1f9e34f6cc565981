//! Heartbeat loop and the health cycle it drives.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures::FutureExt;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::app::{AppKind, Tag};
use crate::broadcast::MessageType;
use crate::error::{ControllerError, panic_message};
use crate::health::{self, HealthCheck, HealthFailure, HealthState, Verdict};

use super::core::Controller;
use super::handler::HandlerRef;

impl<K: AppKind> Controller<K> {
    /// Sleeps one interval, then runs a cycle; repeats until cancelled.
    pub(super) async fn heartbeat_loop(self: Arc<Self>, token: CancellationToken) {
        let interval = self.config.heartbeat_interval;
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let cycle = AssertUnwindSafe(self.run_heartbeat_cycle()).catch_unwind();
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                res = cycle => match res {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => error!(app = %self.name, label = e.as_label(), error = %e, "heartbeat cycle aborted"),
                    Err(panic) => {
                        error!(app = %self.name, info = %panic_message(&*panic), "heartbeat cycle panicked");
                        self.set_health(HealthState::Error).await;
                    }
                },
            }
        }
        debug!(app = %self.name, "heartbeat loop exited");
    }

    /// Evaluates every applicable check once and applies the escalation ladder.
    ///
    /// Returns the resulting state. Fails with [`ControllerError::Configuration`]
    /// (and changes nothing) when the current activity has no registered checks.
    pub async fn run_heartbeat_cycle(&self) -> Result<HealthState, ControllerError> {
        let current = self.activity.current().await;
        let activity_checks: &[HealthCheck<K::CheckType>] = match &current {
            Some(a) => self.registry.activity_checks(a.activity_type())?,
            None => &[],
        };

        let report = health::evaluate(&self.base_checks, &self.registry.core_checks, activity_checks).await;
        let verdict = report.verdict();
        let mut state = verdict.health_state();
        self.set_health(state).await;

        match verdict {
            Verdict::Healthy => {
                self.restarts.store(0, Ordering::SeqCst);
            }
            Verdict::Critical => {
                warn!(app = %self.name, failed = ?report.failed_names().base, "base health check failed");
                self.send_health(MessageType::HealthError, Some(&report)).await;
                self.raise(HealthFailure::Critical);
            }
            Verdict::CoreFailure => {
                warn!(app = %self.name, failed = ?report.failed_names().core, "core health check failed");
                self.send_health(MessageType::HealthError, Some(&report)).await;
                let handler = Arc::clone(&self.registry.on_core_failure);
                if !self.invoke(handler, report.core.clone()).await {
                    state = HealthState::Error;
                }
            }
            Verdict::ActivityFailure => {
                warn!(app = %self.name, failed = ?report.failed_names().activity, "activity health check failed");
                self.send_health(MessageType::HealthError, Some(&report)).await;
                let handler = Arc::clone(&self.registry.on_activity_failure);
                if !self.invoke(handler, report.activity.clone()).await {
                    state = HealthState::Error;
                }
            }
        }

        self.send_health(MessageType::HealthUpdate, None).await;
        Ok(state)
    }

    /// Runs a failure handler; a panic moves the controller to `Error`.
    ///
    /// Returns `false` when the handler panicked.
    async fn invoke(&self, handler: HandlerRef<K>, failed: Vec<K::CheckType>) -> bool {
        let names: Vec<&str> = failed.iter().map(Tag::as_str).collect();
        let call = AssertUnwindSafe(handler.on_failure(self.handler_context(), failed)).catch_unwind();
        match call.await {
            Ok(()) => true,
            Err(panic) => {
                error!(app = %self.name, failed = ?names, info = %panic_message(&*panic), "failure handler panicked");
                self.set_health(HealthState::Error).await;
                false
            }
        }
    }

    /// Non-blocking push to the failure supervisor.
    fn raise(&self, signal: HealthFailure) {
        match self.failure_tx.try_send(signal) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(app = %self.name, ?signal, "failure channel full; signal dropped");
            }
            Err(TrySendError::Closed(_)) => {
                warn!(app = %self.name, ?signal, "failure supervisor gone; signal dropped");
            }
        }
    }
}
