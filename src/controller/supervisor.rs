//! Failure supervisor: turns Critical signals into stop/start cycles.
//!
//! ## Rules
//! - One supervisor per controller; signals are handled one at a time, so restarts never overlap.
//! - Holds a `Weak` reference: it never keeps the controller alive.
//! - A restart is skipped when the controller was stopped deliberately in the meantime.
//! - The backoff sleep is cut short by `shutdown()`.
//! - Restarts go through `start_generation`, never `start`, so the supervisor
//!   never spawns itself.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::app::AppKind;
use crate::error::ControllerError;
use crate::health::HealthFailure;

use super::core::Controller;

impl<K: AppKind> Controller<K> {
    pub(super) fn spawn_supervisor(self: &Arc<Self>, rx: mpsc::Receiver<HealthFailure>) {
        let weak = Arc::downgrade(self);
        let shutdown = self.shutdown.clone();
        tokio::spawn(supervise(weak, rx, shutdown));
    }

    async fn restart(self: &Arc<Self>, signal: HealthFailure, shutdown: &CancellationToken) {
        warn!(app = %self.name, ?signal, "critical health failure; restarting application");

        match self.stop().await {
            Ok(()) => {}
            Err(ControllerError::NotRunning) => {
                info!(app = %self.name, "controller already stopped; restart skipped");
                return;
            }
            Err(e) => {
                error!(app = %self.name, error = %e, "stop before restart failed");
                return;
            }
        }

        let attempt = self.restarts.fetch_add(1, Ordering::SeqCst);
        let delay = self.config.restart_backoff.next(attempt);
        debug!(app = %self.name, attempt, ?delay, "restart scheduled");

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }

        if let Err(e) = self.start_generation().await {
            error!(app = %self.name, label = e.as_label(), error = %e, "restart failed");
        }
    }
}

async fn supervise<K: AppKind>(
    weak: Weak<Controller<K>>,
    mut rx: mpsc::Receiver<HealthFailure>,
    shutdown: CancellationToken,
) {
    loop {
        let signal = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = rx.recv() => match next {
                Some(signal) => signal,
                None => break,
            },
        };

        let Some(controller) = weak.upgrade() else {
            break;
        };
        controller.restart(signal, &shutdown).await;
    }
    debug!("failure supervisor exited");
}
