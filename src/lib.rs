//! blipmq-publisher – a buffering, backpressure-aware publisher that sits
//! between an application and a broker channel client.
//!
//! This crate exports
//!  * `core`    – the publisher, its options and the channel/client traits
//!  * `config`  – TOML-driven publisher defaults
//!  * `logging` – `tracing` subscriber setup
//!
//! Messages published before the client hands over a channel are buffered
//! and flushed in call order once it does. Callbacks of writes that hit the
//! channel's high-water mark are held until the channel reports a drain.

// ───────────────────────────────────────────────────────────
// Public modules
// ───────────────────────────────────────────────────────────
pub mod config;
pub mod core;
pub mod logging;

// ───────────────────────────────────────────────────────────
// Re-exports
// ───────────────────────────────────────────────────────────
pub use config::{load_config, Config};
pub use crate::core::channel::{Channel, ChannelClient, ChannelOptions, DrainListener, ReadyListener};
pub use crate::core::error::PublisherError;
pub use crate::core::options::PublishOptions;
pub use crate::core::publisher::Publisher;
pub use crate::core::scheduler::{Scheduler, TokioScheduler, WriteCallback};
