//! Console logger implementation

use super::traits::{LogLevel, Logger};

/// Environment variable holding the minimum level (`debug`, `info`, `warn`, `error`)
pub const LOG_LEVEL_ENV: &str = "MCPCHAT_LOG_LEVEL";

/// A logger that writes to the console
///
/// Info lines go to stdout so they interleave with chat output; everything
/// else goes to stderr.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
    min_level: LogLevel,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    /// Console logger with the default prefix, level taken from `MCPCHAT_LOG_LEVEL`
    pub fn new() -> Self {
        let min_level = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(LogLevel::Info);
        Self {
            prefix: "[mcpchat]".to_string(),
            min_level,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        if self.enabled(LogLevel::Debug) {
            eprintln!("{} DEBUG: {}", self.prefix, message);
        }
    }

    fn info(&self, message: &str) {
        if self.enabled(LogLevel::Info) {
            println!("{} INFO: {}", self.prefix, message);
        }
    }

    fn warn(&self, message: &str) {
        if self.enabled(LogLevel::Warn) {
            eprintln!("{} WARN: {}", self.prefix, message);
        }
    }

    fn error(&self, message: &str) {
        eprintln!("{} ERROR: {}", self.prefix, message);
    }
}
