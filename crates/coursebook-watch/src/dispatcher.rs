//! Sequential delivery of change signals to a handler.

use crate::{
    events::RawChangeSignal,
    filter::{should_exclude, ExcludePatterns},
    logging::Logger,
    traits::{ChangeHandler, SignalReceiver},
};

/// Drains one subscription's signal stream into a [`ChangeHandler`].
///
/// Each handler call is awaited before the next signal is taken, so the
/// handler sees paths in arrival order and never runs concurrently with
/// itself.
pub struct Dispatcher<H> {
    handler: H,
    exclude: Option<ExcludePatterns>,
    logger: Logger,
}

impl<H: ChangeHandler> Dispatcher<H> {
    /// Create a dispatcher for `handler` that delivers every signal.
    pub fn new(handler: H, logger: Logger) -> Self {
        Self {
            handler,
            exclude: None,
            logger,
        }
    }

    /// Drop signals whose path matches `exclude` before delivery.
    pub fn with_exclude(mut self, exclude: ExcludePatterns) -> Self {
        self.exclude = Some(exclude);
        self
    }

    /// Deliver signals until the sending side is closed.
    pub async fn run(self, mut receiver: SignalReceiver) {
        while let Some(signal) = receiver.recv().await {
            self.dispatch(signal).await;
        }
        self.logger.debug("Change stream closed.");
    }

    /// Deliver a single signal. Returns whether the handler was invoked.
    pub async fn dispatch(&self, signal: RawChangeSignal) -> bool {
        if let Some(exclude) = &self.exclude {
            if should_exclude(&signal.path, exclude, &self.logger) {
                return false;
            }
        }

        self.logger
            .trace(format_args!("File {} has been {}.", signal.path, signal.kind));
        if let Err(e) = self.handler.on_change(signal.path.clone()).await {
            self.logger
                .error(format_args!("Change handler failed for {}: {:#}", signal.path, e));
        }
        true
    }
}
