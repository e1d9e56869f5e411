//! Core traits for the file watching system.

use crate::{error::BoxError, events::RawChangeSignal, platform::PlatformWatchConfig};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use tokio::sync::mpsc;

/// Sending half of the serialized signal stream of one subscription.
pub type SignalSender = mpsc::UnboundedSender<RawChangeSignal>;

/// Receiving half of the serialized signal stream of one subscription.
pub type SignalReceiver = mpsc::UnboundedReceiver<RawChangeSignal>;

/// A producer of raw change signals.
pub trait EventSource: Send + Sync {
    /// Get the backend type identifier.
    fn backend_type(&self) -> &'static str;

    /// Whether this source already drops every path rejected by
    /// `config.ignored`. The dispatcher skips its own exclusion check when
    /// it does.
    fn filters_ignored(&self) -> bool {
        false
    }

    /// Start monitoring `config.roots` and send every change to `sender`.
    ///
    /// Implementations must stop sending once the returned subscription is
    /// closed or dropped.
    fn subscribe(
        &self,
        config: PlatformWatchConfig,
        sender: SignalSender,
    ) -> Result<Box<dyn Subscription>, BoxError>;
}

/// A live subscription to an [`EventSource`].
pub trait Subscription: Send {
    /// Stop monitoring. Calling this more than once is a no-op.
    fn close(&mut self);
}

/// Glob matching capability used by the exclusion filter.
pub trait PatternMatcher: Send + Sync + fmt::Debug {
    /// Whether `path` matches any of the configured patterns.
    fn is_match(&self, path: &str) -> bool;
}

/// Receiver of change notifications.
#[async_trait]
pub trait ChangeHandler: Send + Sync {
    /// Called once per accepted change with the affected path.
    async fn on_change(&self, path: String) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> ChangeHandler for F
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn on_change(&self, path: String) -> anyhow::Result<()> {
        (self)(path).await
    }
}
