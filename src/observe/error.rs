use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid logger format: {0} (expected: text|json)")]
    InvalidFormat(String),
    #[error("logger has already been initialized")]
    AlreadyInitialized,
    #[error("failed to initialize logger: {0}")]
    InitializationFailed(String),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
}

impl LoggerError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            LoggerError::InvalidFormat(_) => "logger_invalid_format",
            LoggerError::AlreadyInitialized => "logger_already_initialized",
            LoggerError::InitializationFailed(_) => "logger_init_failed",
            LoggerError::InvalidLogLevel(_) => "logger_invalid_level",
        }
    }
}
