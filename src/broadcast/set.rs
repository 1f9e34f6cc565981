//! # SubscriberSet: non-blocking fan-out
//!
//! Reference [`Broadcaster`]: each [`Envelope`] is handed to every subscriber
//! through its own bounded queue, without awaiting delivery.
//!
//! ## What it guarantees
//! - `broadcast` / `emit` return immediately.
//! - Per-subscriber FIFO, so a subscriber sees one controller's notifications in emission order.
//! - Panics inside subscribers are caught and logged.
//!
//! ## What it does **not** guarantee
//! - No ordering across subscribers.
//! - No retries on overflow (the envelope is dropped for that subscriber).
//!
//! ```text
//!    broadcast(Envelope)
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_message()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_message()
//!        └────────────────► [queue SN] ─► worker SN ─► on_message()
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{error, warn};

use crate::broadcast::broadcaster::Broadcaster;
use crate::broadcast::message::Envelope;
use crate::broadcast::subscribe::Subscribe;
use crate::error::panic_message;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Envelope>>,
}

/// Fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker per subscriber.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Envelope>>(sub.queue_capacity().max(1));

            let handle = tokio::spawn(async move {
                while let Some(message) = rx.recv().await {
                    let fut = sub.on_message(message.as_ref());
                    if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
                        error!(
                            subscriber = sub.name(),
                            message_type = %message.message_type,
                            info = %panic_message(&*panic),
                            "subscriber panicked"
                        );
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Hands `message` to every subscriber queue.
    ///
    /// A full or closed queue drops the envelope for that subscriber only.
    pub fn emit(&self, message: Envelope) {
        let message = Arc::new(message);
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&message)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscriber = channel.name, message_type = %message.message_type, "queue full; envelope dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!(subscriber = channel.name, message_type = %message.message_type, "worker closed; envelope dropped");
                }
            }
        }
    }

    /// Closes all queues and waits until workers drained them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[async_trait]
impl Broadcaster for SubscriberSet {
    async fn broadcast(&self, message: Envelope) {
        self.emit(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::message::MessageType;
    use serde_json::json;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Collect {
        seen: Mutex<Vec<MessageType>>,
    }

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_message(&self, message: &Envelope) {
            self.seen.lock().await.push(message.message_type);
        }
    }

    struct Explode;

    #[async_trait]
    impl Subscribe for Explode {
        async fn on_message(&self, _: &Envelope) {
            panic!("subscriber bug");
        }
        fn name(&self) -> &'static str {
            "explode"
        }
    }

    fn env(mt: MessageType) -> Envelope {
        Envelope::new("app", mt, json!({}))
    }

    #[tokio::test]
    async fn test_delivers_in_order_and_survives_panicking_peer() {
        let collect = Arc::new(Collect::default());
        let set = SubscriberSet::new(vec![
            Arc::new(Explode) as Arc<dyn Subscribe>,
            collect.clone() as Arc<dyn Subscribe>,
        ]);
        assert_eq!(set.len(), 2);

        set.broadcast(env(MessageType::TaskCreate)).await;
        set.broadcast(env(MessageType::TaskRunning)).await;
        set.broadcast(env(MessageType::TaskFinish)).await;
        set.shutdown().await;

        assert_eq!(
            *collect.seen.lock().await,
            vec![MessageType::TaskCreate, MessageType::TaskRunning, MessageType::TaskFinish]
        );
    }

    #[tokio::test]
    async fn test_empty_set_accepts_messages() {
        let set = SubscriberSet::new(Vec::new());
        assert!(set.is_empty());
        set.emit(env(MessageType::HealthUpdate));
        set.shutdown().await;
    }
}
