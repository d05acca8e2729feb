//! Log events and severity for the action pipeline.
//!
//! Every logging statement issued while an action is bound produces a
//! [`LogEvent`]; the event feeds the action's trace buffer and, at warning
//! level or above, escalates the action's [`ActionResult`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Log severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum LogLevel {
    /// Debugging information.
    Debug,
    /// Informational messages.
    #[default]
    Info,
    /// Warning messages.
    Warn,
    /// Error messages.
    Error,
}

impl LogLevel {
    /// Parse a log level from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or("invalid log level")
    }
}

/// Outcome of an action.
///
/// A join-semilattice: `Ok < Warn < Error`. The action log only ever
/// escalates its result via `max`, never downgrades.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionResult {
    /// The action completed without anomalies.
    #[default]
    Ok,
    /// A recoverable anomaly was recorded.
    Warn,
    /// The action failed.
    Error,
}

impl ActionResult {
    /// Get the string representation (`OK`, `WARN`, `ERROR`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Severity contributed by an event at the given level.
    pub fn from_level(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            _ => Self::Ok,
        }
    }
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One logging event observed during an action.
#[derive(Debug, Clone)]
pub struct LogEvent {
    /// When the event was emitted.
    pub time: DateTime<Utc>,
    /// Severity of the event.
    pub level: LogLevel,
    /// Name of the logger that emitted the event.
    pub logger: String,
    /// Human-readable message.
    pub message: String,
    /// Stable error code supplied by the emitter, if any.
    pub error_code: Option<String>,
    /// Rendered stack trace, if the event carries a failure.
    pub stack_trace: Option<String>,
}

impl LogEvent {
    /// Create a new event with the current timestamp.
    pub fn new(level: LogLevel, logger: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            level,
            logger: logger.into(),
            message: message.into(),
            error_code: None,
            stack_trace: None,
        }
    }

    /// Create a debug-level event.
    pub fn debug(logger: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Debug, logger, message)
    }

    /// Create an info-level event.
    pub fn info(logger: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, logger, message)
    }

    /// Create a warn-level event.
    pub fn warn(logger: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, logger, message)
    }

    /// Create an error-level event.
    pub fn error(logger: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, logger, message)
    }

    /// Set the error code.
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    /// Set the stack trace.
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Format as trace-buffer lines: `HH:MM:SS.mmm LEVEL logger - message`,
    /// followed by the stack trace when present. Always newline-terminated.
    pub fn format_line(&self) -> String {
        let mut line = format!(
            "{} {} {} - {}\n",
            self.time.format("%H:%M:%S%.3f"),
            self.level.as_str().to_uppercase(),
            self.logger,
            self.message
        );
        if let Some(ref stack_trace) = self.stack_trace {
            line.push_str(stack_trace);
            if !stack_trace.ends_with('\n') {
                line.push('\n');
            }
        }
        line
    }
}
