//! Derivation of event source parameters from resolved options.

use crate::{
    filter::{should_exclude, ExcludePatterns},
    logging::Logger,
    options::ResolvedWatchConfig,
};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Exclusion hook handed to the event source.
pub type IgnoredPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Hold add/change events until the file size stops changing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteFinish {
    /// How long the size must stay unchanged.
    pub stability_threshold: Duration,
    /// How often the size is sampled.
    pub poll_interval: Duration,
}

impl Default for WriteFinish {
    fn default() -> Self {
        Self {
            stability_threshold: Duration::from_millis(2000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Collapse temp-file-then-rename saves into a single change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomicWrites {
    /// How long an unlink waits for a matching add.
    pub window: Duration,
}

impl Default for AtomicWrites {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(100),
        }
    }
}

/// Parameter set for an [`EventSource`](crate::EventSource).
#[derive(Clone)]
pub struct PlatformWatchConfig {
    /// Roots to watch.
    pub roots: Vec<PathBuf>,
    /// Directory reported paths are relative to.
    pub cwd: PathBuf,
    /// Keep watching after the initial scan. When false the stream ends
    /// once the initial scan has been delivered.
    pub persistent: bool,
    /// Write-completion debounce, if enabled.
    pub await_write_finish: Option<WriteFinish>,
    /// Atomic-write suppression, if enabled.
    pub atomic: Option<AtomicWrites>,
    /// Use polling instead of native events.
    pub use_polling: bool,
    /// Polling interval in polling mode.
    pub poll_interval: Duration,
    /// Skip paths that cannot be read instead of failing.
    pub ignore_permission_errors: bool,
    /// Watch symlink targets rather than the links.
    pub follow_symlinks: bool,
    /// Do not report paths that already exist when watching starts. When
    /// false they are reported as `add` and `addDir`.
    pub ignore_initial: bool,
    /// Paths for which this returns true are never reported.
    pub ignored: IgnoredPredicate,
}

impl PlatformWatchConfig {
    /// Default policy for `roots`, with nothing ignored.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            cwd: PathBuf::from("."),
            persistent: true,
            await_write_finish: Some(WriteFinish::default()),
            atomic: Some(AtomicWrites::default()),
            use_polling: false,
            poll_interval: Duration::from_millis(100),
            ignore_permission_errors: true,
            follow_symlinks: true,
            ignore_initial: true,
            ignored: Arc::new(|_: &str| false),
        }
    }

    /// Interval at which pending changes are re-examined.
    pub fn settle_interval(&self) -> Duration {
        let write = self.await_write_finish.map(|w| w.poll_interval);
        let atomic = self.atomic.map(|a| a.window);
        match (write, atomic) {
            (Some(w), Some(a)) => w.min(a),
            (Some(d), None) | (None, Some(d)) => d,
            (None, None) => Duration::from_millis(50),
        }
    }
}

impl fmt::Debug for PlatformWatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformWatchConfig")
            .field("roots", &self.roots)
            .field("cwd", &self.cwd)
            .field("persistent", &self.persistent)
            .field("await_write_finish", &self.await_write_finish)
            .field("atomic", &self.atomic)
            .field("use_polling", &self.use_polling)
            .field("poll_interval", &self.poll_interval)
            .field("ignore_permission_errors", &self.ignore_permission_errors)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("ignore_initial", &self.ignore_initial)
            .field("ignored", &"<function>")
            .finish()
    }
}

/// Build the exclusion hook for `patterns`.
pub fn ignored_predicate(patterns: ExcludePatterns, logger: Logger) -> IgnoredPredicate {
    Arc::new(move |path: &str| should_exclude(path, &patterns, &logger))
}

/// Translate resolved options into event source parameters.
pub fn build_platform_config(config: &ResolvedWatchConfig, logger: &Logger) -> PlatformWatchConfig {
    PlatformWatchConfig {
        use_polling: config.use_polling(),
        ignored: ignored_predicate(config.exclude().clone(), logger.clone()),
        ..PlatformWatchConfig::new(config.source().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogContext, LogLevel};
    use crate::options::WatchOptions;

    fn logger() -> Logger {
        LogContext::default().logger("file-watcher")
    }

    #[test]
    fn fixed_policy_is_applied() {
        let resolved = WatchOptions::new("./test").resolve().unwrap();
        let platform = build_platform_config(&resolved, &logger());

        assert_eq!(platform.roots, vec![PathBuf::from("./test")]);
        assert_eq!(platform.cwd, PathBuf::from("."));
        assert!(platform.persistent);
        assert_eq!(platform.await_write_finish, Some(WriteFinish::default()));
        assert_eq!(platform.atomic, Some(AtomicWrites::default()));
        assert!(!platform.use_polling);
        assert!(platform.ignore_initial);
        assert!(platform.ignore_permission_errors);
        assert!(platform.follow_symlinks);
    }

    #[test]
    fn write_finish_defaults() {
        let write = WriteFinish::default();
        assert_eq!(write.stability_threshold, Duration::from_millis(2000));
        assert_eq!(write.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn polling_follows_options() {
        let resolved = WatchOptions::new("./test")
            .with_polling(true)
            .resolve()
            .unwrap();
        assert!(build_platform_config(&resolved, &logger()).use_polling);
    }

    #[test]
    fn ignored_uses_exclude_patterns() {
        let resolved = WatchOptions::new("./test")
            .with_exclude(["**/*.log"])
            .resolve()
            .unwrap();
        let platform = build_platform_config(&resolved, &logger());

        assert!((platform.ignored)("test.log"));
        assert!(!(platform.ignored)("test.txt"));
    }

    #[test]
    fn default_exclude_ignores_nothing() {
        let resolved = WatchOptions::new("./test").resolve().unwrap();
        let platform = build_platform_config(&resolved, &logger());
        assert!(!(platform.ignored)("any-file.txt"));
    }

    #[test]
    fn log_level_does_not_change_the_configuration() {
        let resolved = WatchOptions::new("./test")
            .with_exclude(["**/*.log"])
            .resolve()
            .unwrap();
        let logger = logger();
        let before = build_platform_config(&resolved, &logger);

        for level in [LogLevel::Trace, LogLevel::Error, LogLevel::Debug] {
            logger.set_level(level);
        }
        let after = build_platform_config(&resolved, &logger);

        assert_eq!(format!("{:?}", before), format!("{:?}", after));
        assert_eq!((before.ignored)("a.log"), (after.ignored)("a.log"));
        assert_eq!((before.ignored)("a.txt"), (after.ignored)("a.txt"));
    }

    #[test]
    fn settle_interval_is_the_shortest_wait() {
        let mut platform = PlatformWatchConfig::new(vec![PathBuf::from(".")]);
        assert_eq!(platform.settle_interval(), Duration::from_millis(100));

        platform.atomic = Some(AtomicWrites {
            window: Duration::from_millis(30),
        });
        assert_eq!(platform.settle_interval(), Duration::from_millis(30));

        platform.atomic = None;
        platform.await_write_finish = None;
        assert_eq!(platform.settle_interval(), Duration::from_millis(50));
    }

    #[test]
    fn debug_output_hides_the_predicate() {
        let platform = PlatformWatchConfig::new(vec![PathBuf::from("./test")]);
        let debug = format!("{:?}", platform);
        assert!(debug.contains("<function>"));
        assert!(debug.contains("./test"));
    }
}
