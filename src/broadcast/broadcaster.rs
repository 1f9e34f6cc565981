//! The [`Broadcaster`] seam and the crate-private envelope factory.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::broadcast::message::{Envelope, MessageType};

/// Delivery primitive used by the controller for every notification.
///
/// Delivery is at-most-once and best effort; an implementation must not
/// block the caller for long, since the processor and heartbeat loops await it.
#[async_trait]
pub trait Broadcaster: Send + Sync + 'static {
    async fn broadcast(&self, message: Envelope);
}

/// Envelope factory bound to one application name and one broadcaster.
#[derive(Clone)]
pub(crate) struct Notifier {
    app: Arc<str>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl Notifier {
    pub(crate) fn new(app: &str, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            app: Arc::from(app),
            broadcaster,
        }
    }

    pub(crate) async fn send<P>(&self, message_type: MessageType, payload: &P)
    where
        P: Serialize + Sync + ?Sized,
    {
        let payload = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(message_type = %message_type, error = %e, "payload serialization failed; broadcast dropped");
                return;
            }
        };
        let envelope = Envelope::new(self.app.as_ref(), message_type, payload);
        self.broadcaster.broadcast(envelope).await;
    }
}
