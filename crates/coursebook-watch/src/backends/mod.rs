//! Event source implementations.

mod notify_backend;

pub use notify_backend::NotifySource;
