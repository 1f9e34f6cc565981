//! Process-wide `tracing` setup for binaries embedding a controller.
//!
//! ```rust,no_run
//! use appvisor::{LoggerConfig, LoggerFormat, logger_init};
//!
//! let cfg = LoggerConfig { format: LoggerFormat::Json, level: "appvisor=debug,info".into(), ..Default::default() };
//! logger_init(&cfg).expect("logger");
//! ```

mod config;
mod error;
mod format;
mod log;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Installs the global subscriber described by `cfg`.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    match cfg.format {
        LoggerFormat::Text => log::Logger::text(cfg),
        LoggerFormat::Json => log::Logger::json(cfg),
    }
}
