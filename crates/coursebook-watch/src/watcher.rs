//! The public entry point: validated options, one event source, one logger.

use crate::{
    backends::NotifySource,
    dispatcher::Dispatcher,
    error::{BoxError, Error, Result},
    logging::{LogContext, LogLevel, Logger},
    options::{ResolvedWatchConfig, WatchOptions},
    platform::build_platform_config,
    traits::{ChangeHandler, EventSource, Subscription},
};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Name of the logger every watcher writes to.
pub const LOGGER_NAME: &str = "file-watcher";

const SETUP_FAILED: &str = "Error watching files.";

/// Watches the configured roots and reports changed paths to a handler.
///
/// Options are validated when the watcher is built, so a `Watcher` always
/// holds a usable configuration. Each call to [`Watcher::watch`] starts an
/// independent subscription.
pub struct Watcher {
    config: ResolvedWatchConfig,
    source: Arc<dyn EventSource>,
    logger: Logger,
}

impl Watcher {
    /// Create a watcher backed by [`NotifySource`] with a fresh log context.
    pub fn new(options: WatchOptions) -> Result<Self> {
        Self::with_event_source(options, Arc::new(NotifySource::new()), LogContext::default())
    }

    /// Create a watcher on a custom event source and log context.
    pub fn with_event_source(
        options: WatchOptions,
        source: Arc<dyn EventSource>,
        logs: LogContext,
    ) -> Result<Self> {
        let config = options.resolve()?;
        Ok(Self {
            config,
            source,
            logger: logs.logger(LOGGER_NAME),
        })
    }

    /// Change the diagnostic verbosity. Takes effect immediately.
    pub fn set_log_level(&self, level: LogLevel) {
        self.logger.set_level(level);
    }

    /// The validated configuration.
    pub fn config(&self) -> &ResolvedWatchConfig {
        &self.config
    }

    /// Start watching and deliver every accepted change to `handler`.
    ///
    /// Must be called from within a tokio runtime. The subscription lives
    /// as long as the returned handle.
    pub fn watch<H>(&self, handler: H) -> Result<WatchHandle>
    where
        H: ChangeHandler + 'static,
    {
        match self.start(handler) {
            Ok(handle) => {
                self.logger
                    .info(format_args!("Watching {}.", self.config.source_display()));
                Ok(handle)
            }
            Err(cause) => {
                self.logger.error_with(SETUP_FAILED, &*cause);
                Err(Error::watch_setup(SETUP_FAILED, cause))
            }
        }
    }

    fn start<H>(&self, handler: H) -> std::result::Result<WatchHandle, BoxError>
    where
        H: ChangeHandler + 'static,
    {
        let runtime = Handle::try_current()?;
        let platform = build_platform_config(&self.config, &self.logger);

        let (sender, receiver) = mpsc::unbounded_channel();
        let subscription = self.source.subscribe(platform, sender)?;

        let mut dispatcher = Dispatcher::new(handler, self.logger.clone());
        if !self.source.filters_ignored() {
            dispatcher = dispatcher.with_exclude(self.config.exclude().clone());
        }
        let task = runtime.spawn(dispatcher.run(receiver));

        Ok(WatchHandle {
            subscription,
            task: Some(task),
        })
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("config", &self.config)
            .field("source", &self.source.backend_type())
            .field("logger", &self.logger.name())
            .finish()
    }
}

/// A live subscription started by [`Watcher::watch`].
///
/// Dropping the handle closes the subscription. Signals already queued are
/// still delivered before the dispatcher stops.
pub struct WatchHandle {
    subscription: Box<dyn Subscription>,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Wait until the dispatcher stops, which happens once the event source
    /// closes its stream.
    pub async fn closed(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Close the subscription and wait for queued signals to be delivered.
    pub async fn shutdown(mut self) {
        self.subscription.close();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.subscription.close();
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle")
            .field("running", &self.task.as_ref().is_some_and(|t| !t.is_finished()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::platform::PlatformWatchConfig;
    use crate::traits::SignalSender;
    use parking_lot::Mutex;
    use tracing_test::traced_test;

    /// Source that accepts or rejects every subscription.
    struct StubSource {
        fail: bool,
        subscribed: Mutex<Option<(PlatformWatchConfig, SignalSender)>>,
    }

    impl StubSource {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                subscribed: Mutex::new(None),
            })
        }
    }

    struct NoopSubscription;

    impl Subscription for NoopSubscription {
        fn close(&mut self) {}
    }

    impl EventSource for StubSource {
        fn backend_type(&self) -> &'static str {
            "stub"
        }

        fn subscribe(
            &self,
            config: PlatformWatchConfig,
            sender: SignalSender,
        ) -> std::result::Result<Box<dyn Subscription>, BoxError> {
            if self.fail {
                return Err("backend unavailable".into());
            }
            *self.subscribed.lock() = Some((config, sender));
            Ok(Box::new(NoopSubscription))
        }
    }

    fn ignore(_: String) -> std::future::Ready<anyhow::Result<()>> {
        std::future::ready(Ok(()))
    }

    #[test]
    fn construction_requires_a_source() {
        let err = Watcher::with_event_source(
            WatchOptions::default(),
            StubSource::new(false),
            LogContext::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.to_string(), "Source is required");
    }

    #[test]
    fn set_log_level_targets_the_watcher_logger() {
        let logs = LogContext::default();
        let watcher =
            Watcher::with_event_source(WatchOptions::new("./test"), StubSource::new(false), logs.clone())
                .unwrap();

        watcher.set_log_level(LogLevel::Trace);
        assert_eq!(logs.level(LOGGER_NAME), LogLevel::Trace);
        assert_eq!(logs.level("someone-else"), LogLevel::Info);
    }

    #[tokio::test]
    #[traced_test]
    async fn successful_watch_logs_the_sources() {
        let source = StubSource::new(false);
        let watcher = Watcher::with_event_source(
            WatchOptions::with_sources(["./a", "./b"]),
            source.clone(),
            LogContext::default(),
        )
        .unwrap();

        let _handle = watcher.watch(ignore).unwrap();

        assert!(source.subscribed.lock().is_some());
        assert!(logs_contain("Watching ./a,./b."));
    }

    #[tokio::test]
    #[traced_test]
    async fn failed_watch_logs_and_wraps_the_cause() {
        let watcher = Watcher::with_event_source(
            WatchOptions::new("./test"),
            StubSource::new(true),
            LogContext::default(),
        )
        .unwrap();

        let err = watcher.watch(ignore).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::WatchSetup);
        assert_eq!(err.message(), "Error watching files.");
        assert_eq!(
            std::error::Error::source(&err).unwrap().to_string(),
            "backend unavailable"
        );
        assert!(logs_contain("Error watching files."));
        assert!(logs_contain("backend unavailable"));
    }

    #[test]
    fn watch_outside_a_runtime_is_a_setup_error() {
        let source = StubSource::new(false);
        let watcher = Watcher::with_event_source(
            WatchOptions::new("./test"),
            source.clone(),
            LogContext::default(),
        )
        .unwrap();

        let err = watcher.watch(ignore).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WatchSetup);
        assert!(source.subscribed.lock().is_none());
    }

    #[test]
    fn debug_names_the_backend() {
        let watcher = Watcher::with_event_source(
            WatchOptions::new("./test"),
            StubSource::new(false),
            LogContext::default(),
        )
        .unwrap();
        let debug = format!("{:?}", watcher);
        assert!(debug.contains("stub"));
        assert!(debug.contains(LOGGER_NAME));
    }
}
