//! Publisher module for blipmq-publisher
//! Buffers messages until the channel is ready and tracks write backpressure.
#[allow(clippy::module_inception)]
pub mod publisher;

pub use publisher::Publisher;
