//! # Controller
//!
//! [`Controller`] owns the task queue, the health state and the activity slot
//! of one application, and runs three loops over them:
//!
//! - **processor**: executes queued tasks strictly one at a time, in submission order;
//! - **heartbeat**: evaluates health checks every `heartbeat_interval`;
//! - **supervisor**: restarts the application after a base check failure.
//!
//! Build one with [`Controller::builder`]:
//!
//! ```rust,ignore
//! let controller = Controller::<Chat>::builder(app, broadcaster)
//!     .config(ControllerConfig::from_env()?)
//!     .validator(ChatTask::LearnServers, validators::no_params)
//!     .executor(ChatTask::LearnServers, learn_servers)
//!     .core_check(ChatCheck::IsLoggedIn, move || probe.logged_in())
//!     .activity_checks(ChatActivity::InVoiceChannel, voice_checks)
//!     .activity_checks(ChatActivity::ScreenSharing, Vec::new())
//!     .build()?;
//!
//! controller.start().await?;
//! let id = controller.submit_task(ChatTask::LearnServers, Params::new()).await?;
//! ```

mod builder;
mod core;
mod handler;
mod heartbeat;
mod processor;
mod registry;
mod supervisor;

pub use self::builder::ControllerBuilder;
pub use self::core::Controller;
pub use self::handler::{FailureHandler, HandlerContext, HandlerFn, HandlerRef};
