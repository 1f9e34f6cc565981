//! Health checks, their evaluation and the controller-wide health state.

mod check;
mod report;
mod state;

pub(crate) use check::base_checks;
pub use check::{BaseCheck, HealthCheck};
pub use report::{FailedChecks, HealthReport, Verdict, evaluate};
pub use state::{HealthFailure, HealthState};
