//! Name-scoped loggers with a runtime-adjustable threshold.
//!
//! A [`LogContext`] owns the per-name thresholds. Loggers handed out by the
//! context check their threshold on every call and forward surviving
//! messages to `tracing`, tagged with the logger name.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Severity threshold for a [`Logger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-path diagnostics.
    Trace,
    /// Debugging output.
    Debug,
    /// Lifecycle messages.
    Info,
    /// Recoverable problems.
    Warn,
    /// Failures.
    Error,
}

impl LogLevel {
    /// Lowercase name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("Unknown log level: {}", other)),
        }
    }
}

#[derive(Debug, Default)]
struct Levels {
    default: LogLevel,
    by_name: HashMap<String, LogLevel>,
}

/// Registry of logger thresholds, shared by every logger it creates.
///
/// Cloning is cheap and clones share state.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    levels: Arc<RwLock<Levels>>,
}

impl LogContext {
    /// Create a context whose loggers start at `default`.
    pub fn new(default: LogLevel) -> Self {
        Self {
            levels: Arc::new(RwLock::new(Levels {
                default,
                by_name: HashMap::new(),
            })),
        }
    }

    /// Get the logger called `name`.
    pub fn logger(&self, name: impl Into<String>) -> Logger {
        Logger {
            name: Arc::from(name.into()),
            context: self.clone(),
        }
    }

    /// Set the threshold of the logger called `name`.
    pub fn set_level(&self, name: &str, level: LogLevel) {
        self.levels.write().by_name.insert(name.to_string(), level);
    }

    /// Current threshold of the logger called `name`.
    pub fn level(&self, name: &str) -> LogLevel {
        let levels = self.levels.read();
        levels.by_name.get(name).copied().unwrap_or(levels.default)
    }
}

/// Leveled logger scoped to one name.
#[derive(Debug, Clone)]
pub struct Logger {
    name: Arc<str>,
    context: LogContext,
}

impl Logger {
    /// Name this logger was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Change this logger's threshold.
    pub fn set_level(&self, level: LogLevel) {
        self.context.set_level(&self.name, level);
    }

    /// Current threshold.
    pub fn level(&self) -> LogLevel {
        self.context.level(&self.name)
    }

    /// Whether a message at `level` would be emitted.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    /// Log at trace level.
    pub fn trace(&self, message: impl fmt::Display) {
        if self.enabled(LogLevel::Trace) {
            tracing::trace!(logger = %self.name, "{}", message);
        }
    }

    /// Log at debug level.
    pub fn debug(&self, message: impl fmt::Display) {
        if self.enabled(LogLevel::Debug) {
            tracing::debug!(logger = %self.name, "{}", message);
        }
    }

    /// Log at info level.
    pub fn info(&self, message: impl fmt::Display) {
        if self.enabled(LogLevel::Info) {
            tracing::info!(logger = %self.name, "{}", message);
        }
    }

    /// Log at warn level.
    pub fn warn(&self, message: impl fmt::Display) {
        if self.enabled(LogLevel::Warn) {
            tracing::warn!(logger = %self.name, "{}", message);
        }
    }

    /// Log at error level.
    pub fn error(&self, message: impl fmt::Display) {
        if self.enabled(LogLevel::Error) {
            tracing::error!(logger = %self.name, "{}", message);
        }
    }

    /// Log an error together with the failure that caused it.
    pub fn error_with(&self, message: impl fmt::Display, cause: &(dyn std::error::Error + 'static)) {
        if self.enabled(LogLevel::Error) {
            tracing::error!(logger = %self.name, error = %cause, "{}", message);
        }
    }
}
