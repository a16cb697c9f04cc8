use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::warn;

use crate::core::error::PublisherError;

/// Continuation run once a message has left the publisher's hands.
pub type WriteCallback = Box<dyn FnOnce() + Send + 'static>;

/// Runs write callbacks on a later turn, never inside the publishing call.
pub trait Scheduler: Send + Sync + 'static {
    fn defer(&self, task: WriteCallback);
}

/// Feeds callbacks to a single worker task on a tokio runtime, which runs
/// them one at a time in the order they were deferred.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    tx: UnboundedSender<WriteCallback>,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        let (tx, mut rx) = unbounded_channel::<WriteCallback>();
        handle.spawn(async move {
            while let Some(task) = rx.recv().await {
                task();
            }
        });
        Self { tx }
    }

    /// Binds to the runtime the caller is running on.
    pub fn current() -> Result<Self, PublisherError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| PublisherError::NoRuntime)
    }
}

impl Scheduler for TokioScheduler {
    fn defer(&self, task: WriteCallback) {
        if self.tx.send(task).is_err() {
            warn!(
                target: "blipmq_publisher::publisher",
                "Scheduler runtime shut down. Write callback dropped"
            );
        }
    }
}
