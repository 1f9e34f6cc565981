use std::io::IsTerminal;

use crate::observe::format::LoggerFormat;

/// Logger settings.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive, e.g. `info` or `appvisor=debug,warn`.
    pub level: String,
    pub with_targets: bool,
    /// ANSI colors; ignored for JSON.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
        }
    }
}
