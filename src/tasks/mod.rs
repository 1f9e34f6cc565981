//! Task record, executors and validators.
//!
//! - [`Task`] the submitted unit of work and its status machine
//! - [`Executor`] / [`ExecutorFn`] runs a task type
//! - [`Validator`] / [`validators`] gate submission

mod executor;
mod task;
mod validator;

pub use executor::{AppResponse, ExecResult, Executor, ExecutorFn, ExecutorRef, TaskContext};
pub use task::{InvalidTransition, Params, Task, TaskId, TaskStatus, TaskView};
pub use validator::{Validator, validators};
