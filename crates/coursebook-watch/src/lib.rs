//! # Coursebook Watch
//!
//! Low-noise file change notifications. A [`Watcher`] monitors one or more
//! roots, drops paths matching the configured exclude globs, holds writes
//! back until they have finished, folds atomic saves into a single change,
//! and hands each remaining path to a caller-supplied handler, one at a
//! time and in arrival order.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │  WatchOptions   │───▶│     Watcher      │───▶│   EventSource   │
//! │  (validated)    │    │  (facade, log)   │    │ (notify + settle│
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//!                                 │                       │
//!                                 ▼                       ▼
//!                        ┌──────────────────┐    ┌─────────────────┐
//!                        │   Dispatcher     │◀───│ RawChangeSignal │
//!                        │ (exclude, order) │    │   (kind, path)  │
//!                        └──────────────────┘    └─────────────────┘
//!                                 │
//!                                 ▼
//!                        ┌──────────────────┐
//!                        │  ChangeHandler   │
//!                        └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use coursebook_watch::prelude::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let watcher = Watcher::new(WatchOptions::new("./docs").with_exclude(["**/*.log"]))?;
//! watcher.set_log_level(LogLevel::Debug);
//!
//! let handle = watcher.watch(|path: String| async move {
//!     println!("File changed: {}", path);
//!     anyhow::Ok(())
//! })?;
//! handle.closed().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod backends;
mod dispatcher;
pub mod error;
mod events;
mod filter;
pub mod logging;
mod options;
pub mod platform;
pub mod traits;
mod utils;
mod watcher;

pub use backends::NotifySource;
pub use dispatcher::Dispatcher;
pub use error::{BoxError, Error, ErrorKind, Result};
pub use events::{ChangeKind, RawChangeSignal};
pub use filter::{should_exclude, ExcludePatterns, GlobSetMatcher};
pub use logging::{LogContext, LogLevel, Logger};
pub use options::{ResolvedWatchConfig, WatchOptions};
pub use platform::{build_platform_config, AtomicWrites, PlatformWatchConfig, WriteFinish};
pub use traits::{ChangeHandler, EventSource, PatternMatcher, SignalReceiver, SignalSender, Subscription};
pub use utils::{is_editor_artifact, WriteSettler};
pub use watcher::{WatchHandle, Watcher, LOGGER_NAME};

/// Re-export common types for convenience
pub mod prelude {
    pub use crate::{
        ChangeHandler, ChangeKind, Error, ErrorKind, EventSource, LogContext, LogLevel, Result,
        WatchHandle, WatchOptions, Watcher,
    };
}
