//! Notifications leaving the controller.
//!
//! - [`Envelope`] / [`MessageType`] the wire shape
//! - [`Broadcaster`] the delivery primitive the controller calls
//! - [`SubscriberSet`] + [`Subscribe`] reference fan-out
//! - `LogWriter` (feature `logging`) a subscriber that logs every envelope

mod broadcaster;
mod message;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub(crate) use broadcaster::Notifier;
pub use broadcaster::Broadcaster;
pub use message::{Envelope, HealthPayload, LifecyclePayload, MessageType};
pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
