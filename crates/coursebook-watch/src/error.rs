//! Error types for the file watching system.

use thiserror::Error;

/// Boxed error used to carry causes across the event source seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by [`Watcher`](crate::Watcher) construction and setup.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing options, raised at construction.
    #[error("{message}")]
    Config {
        /// Human-readable description.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The event source could not start, raised from `watch`.
    #[error("{message}")]
    WatchSetup {
        /// Human-readable description.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxError>,
    },
}

/// Discriminant of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::Config`].
    Configuration,
    /// See [`Error::WatchSetup`].
    WatchSetup,
}

impl Error {
    /// Configuration error without a cause.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Watch setup error wrapping the failure that caused it.
    pub fn watch_setup(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Error::WatchSetup {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    /// Which kind of failure this is.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config { .. } => ErrorKind::Configuration,
            Error::WatchSetup { .. } => ErrorKind::WatchSetup,
        }
    }

    /// The message without the cause chain.
    pub fn message(&self) -> &str {
        match self {
            Error::Config { message, .. } | Error::WatchSetup { message, .. } => message,
        }
    }
}

/// Result type for file watching operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Convert globset errors to our error type.
impl From<globset::Error> for Error {
    fn from(err: globset::Error) -> Self {
        Error::Config {
            message: format!("Invalid exclude pattern: {}", err.glob().unwrap_or("<unknown>")),
            source: Some(Box::new(err)),
        }
    }
}
