//! # Subscriber contract
//!
//! `Subscribe` is the consumer side of [`SubscriberSet`](crate::SubscriberSet):
//! a WebSocket session, an audit log, a test recorder. Each subscriber is
//! driven by its own worker fed by a bounded queue.
//!
//! ## Contract
//! - Implementations may be slow; they never block the controller nor other subscribers.
//! - On queue overflow envelopes for that subscriber are **dropped** (warn).
//!
//! ## Example (skeleton)
//! ```rust
//! // use appvisor::{Envelope, Subscribe};
//! //
//! // struct Socket { tx: ws::Sender }
//! // #[async_trait::async_trait]
//! // impl Subscribe for Socket {
//! //     async fn on_message(&self, message: &Envelope) {
//! //         if let Ok(text) = message.to_json() { let _ = self.tx.send(text).await; }
//! //     }
//! //     fn name(&self) -> &'static str { "ws" }
//! //     fn queue_capacity(&self) -> usize { 256 }
//! // }
//! ```

use async_trait::async_trait;

use crate::broadcast::message::Envelope;

/// Contract for envelope subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle one envelope.
    async fn on_message(&self, message: &Envelope);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
