//! Seams to the underlying broker client.
//!
//! The publisher never talks to the network itself. It asks a
//! [`ChannelClient`] to be told when a channel is available, then drives that
//! [`Channel`] through its two send primitives and its drain event.

use bytes::Bytes;
use std::sync::Arc;

use crate::core::error::PublisherError;

/// Pass-through fields handed to the channel on every send
/// (delivery mode, headers, persistence flags, ...).
pub type ChannelOptions = toml::Table;

/// Invoked by the client once, with the channel to publish on.
///
/// The returned error is the first channel failure hit while flushing the
/// messages buffered before readiness.
pub type ReadyListener<C> = Box<dyn FnOnce(Arc<C>) -> Result<(), PublisherError> + Send + 'static>;

/// Invoked by the channel every time its write buffer has room again.
pub type DrainListener = Box<dyn Fn() + Send + Sync + 'static>;

/// A broker channel able to publish to exchanges and send directly to queues.
///
/// Both primitives return `Ok(true)` when the write was accepted without
/// crossing the write buffer's high-water mark and `Ok(false)` when the
/// buffer is full and the caller should wait for a drain.
pub trait Channel: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        content: Bytes,
        options: &ChannelOptions,
    ) -> Result<bool, Self::Error>;

    fn send_to_queue(
        &self,
        queue: &str,
        content: Bytes,
        options: &ChannelOptions,
    ) -> Result<bool, Self::Error>;

    /// Subscribes to the drain (backpressure relief) event.
    fn on_drain(&self, listener: DrainListener);
}

/// A broker client that announces when its channel is ready.
pub trait ChannelClient {
    type Channel: Channel;

    /// Registers a readiness listener.
    ///
    /// A client that cannot take one (closed, or built without a readiness
    /// hook) hands the listener back.
    fn add_ready_listener(
        &self,
        listener: ReadyListener<Self::Channel>,
    ) -> Result<(), ReadyListener<Self::Channel>>;
}
