//! # Capability contract of the supervised application.
//!
//! The controller never talks to the application directly; it only sees the
//! [`ManagedApp`] probes and actions. An [`AppKind`] ties one driver type to
//! the closed sets of task, activity and check tags it understands.
//!
//! ## Example
//! ```rust
//! use appvisor::{AppKind, ManagedApp, Tag};
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Job { Ping }
//!
//! impl Tag for Job {
//!     const VARIANTS: &'static [Self] = &[Job::Ping];
//!     fn as_str(&self) -> &'static str { "ping" }
//! }
//!
//! struct Browser;
//!
//! #[async_trait::async_trait]
//! impl ManagedApp for Browser {
//!     fn name(&self) -> &str { "browser" }
//!     async fn is_running(&self) -> bool { true }
//!     async fn is_interactable(&self) -> bool { true }
//!     async fn is_locatable(&self) -> bool { true }
//!     async fn launch(&self) -> bool { true }
//!     async fn terminate(&self) -> bool { true }
//! }
//!
//! struct BrowserKind;
//!
//! impl AppKind for BrowserKind {
//!     type App = Browser;
//!     type TaskType = Job;
//!     type ActivityType = Job;
//!     type CheckType = Job;
//! }
//! ```

use std::fmt::Debug;
use std::hash::Hash;

use async_trait::async_trait;

/// Probes and actions the controller needs from the application driver.
///
/// Every method reports its outcome as `bool`; the driver maps its own
/// errors to `false`.
#[async_trait]
pub trait ManagedApp: Send + Sync + 'static {
    /// Stable application name, used as the `app` field of every broadcast.
    fn name(&self) -> &str;

    /// The application process exists.
    async fn is_running(&self) -> bool;

    /// The application accepts input.
    async fn is_interactable(&self) -> bool;

    /// The application's window or endpoint can be found.
    async fn is_locatable(&self) -> bool;

    /// Bring the application up. Returns whether it came up.
    async fn launch(&self) -> bool;

    /// Tear the application down. Returns whether it went away.
    async fn terminate(&self) -> bool;
}

/// A closed, application-specific identifier (task type, activity type or check type).
pub trait Tag: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Every value of the tag set.
    const VARIANTS: &'static [Self];

    /// Snake_case wire name.
    fn as_str(&self) -> &'static str;
}

/// Binds one driver with its tag sets.
pub trait AppKind: Send + Sync + 'static {
    /// Driver type.
    type App: ManagedApp;
    /// Task types accepted by `submit_task`.
    type TaskType: Tag;
    /// Activity types the application can be engaged in.
    type ActivityType: Tag;
    /// Application-core and activity check types.
    type CheckType: Tag;
}
