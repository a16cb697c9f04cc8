pub mod channel;
pub mod error;
pub mod options;
pub mod publisher;
pub mod scheduler;
