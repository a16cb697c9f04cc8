use bytes::Bytes;
use parking_lot::{Mutex, ReentrantMutex};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

use crate::core::channel::{Channel, ChannelClient, ReadyListener};
use crate::core::error::PublisherError;
use crate::core::options::PublishOptions;
use crate::core::scheduler::{Scheduler, TokioScheduler, WriteCallback};

const TARGET: &str = "blipmq_publisher::publisher";

#[derive(Debug)]
enum Destination {
    Exchange,
    Queue(String),
}

/// A call made before the channel was ready.
struct PendingMessage {
    destination: Destination,
    content: Bytes,
    options: PublishOptions,
    callback: Option<WriteCallback>,
}

enum Gate<C> {
    Buffering(VecDeque<PendingMessage>),
    Ready(Arc<C>),
}

struct Inner<C> {
    options: PublishOptions,
    /// Held across every channel call so sends reach the channel in call
    /// order. Re-entrant for callbacks that publish from inside a drain.
    gate: ReentrantMutex<RefCell<Gate<C>>>,
    write_callbacks: Mutex<VecDeque<WriteCallback>>,
    /// Bumped on every drain event, before the queue is taken.
    drain_generation: AtomicU64,
    scheduler: Box<dyn Scheduler>,
}

/// Publishes through a broker channel that may not exist yet.
///
/// - Before the client reports readiness, every call is buffered.
/// - On readiness the buffer is flushed in call order, ahead of any new call.
/// - A callback runs on a later turn once its write was accepted, or after
///   the next drain event if the write hit the channel's high-water mark.
///
/// Buffers are unbounded.
pub struct Publisher<C: Channel> {
    inner: Arc<Inner<C>>,
}

impl<C: Channel> Clone for Publisher<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Channel> Publisher<C> {
    /// Creates a publisher whose callbacks are spawned on the current tokio
    /// runtime.
    ///
    /// # Errors
    /// * `NoRuntime` - called outside a tokio runtime.
    /// * `InvalidClient` - the client refused the readiness listener.
    pub fn new<K>(client: &K, options: PublishOptions) -> Result<Self, PublisherError>
    where
        K: ChannelClient<Channel = C> + ?Sized,
    {
        let scheduler = TokioScheduler::current()?;
        Self::with_scheduler(client, options, scheduler)
    }

    /// Creates a publisher that defers callbacks through `scheduler`.
    pub fn with_scheduler<K, S>(
        client: &K,
        options: PublishOptions,
        scheduler: S,
    ) -> Result<Self, PublisherError>
    where
        K: ChannelClient<Channel = C> + ?Sized,
        S: Scheduler,
    {
        let inner = Arc::new(Inner {
            options,
            gate: ReentrantMutex::new(RefCell::new(Gate::Buffering(VecDeque::new()))),
            write_callbacks: Mutex::new(VecDeque::new()),
            drain_generation: AtomicU64::new(0),
            scheduler: Box::new(scheduler),
        });

        let weak = Arc::downgrade(&inner);
        let listener: ReadyListener<C> = Box::new(move |channel| match weak.upgrade() {
            Some(inner) => inner.on_ready(channel),
            None => {
                debug!(target: TARGET, "Publisher dropped before channel became ready");
                Ok(())
            }
        });

        client
            .add_ready_listener(listener)
            .map_err(|_| PublisherError::InvalidClient)?;

        Ok(Self { inner })
    }

    /// Publishes `content` to an exchange.
    ///
    /// Exchange and routing key come from `options`, falling back to the
    /// publisher defaults. Strings are sent as their UTF-8 bytes.
    pub fn publish(
        &self,
        content: impl Into<Bytes>,
        options: PublishOptions,
    ) -> Result<(), PublisherError> {
        self.inner
            .dispatch(Destination::Exchange, content.into(), options, None)
    }

    /// Publishes borrowed text, copied as UTF-8.
    pub fn publish_text(&self, text: &str, options: PublishOptions) -> Result<(), PublisherError> {
        self.publish(Bytes::copy_from_slice(text.as_bytes()), options)
    }

    /// Like [`Publisher::publish`], running `callback` once the write has
    /// been handed to the channel's buffer.
    pub fn publish_with_callback<F>(
        &self,
        content: impl Into<Bytes>,
        options: PublishOptions,
        callback: F,
    ) -> Result<(), PublisherError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.dispatch(
            Destination::Exchange,
            content.into(),
            options,
            Some(Box::new(callback)),
        )
    }

    /// Sends `content` straight to `queue`, bypassing exchanges.
    pub fn send_to_queue(
        &self,
        queue: impl Into<String>,
        content: impl Into<Bytes>,
        options: PublishOptions,
    ) -> Result<(), PublisherError> {
        self.inner
            .dispatch(Destination::Queue(queue.into()), content.into(), options, None)
    }

    pub fn send_to_queue_with_callback<F>(
        &self,
        queue: impl Into<String>,
        content: impl Into<Bytes>,
        options: PublishOptions,
        callback: F,
    ) -> Result<(), PublisherError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.dispatch(
            Destination::Queue(queue.into()),
            content.into(),
            options,
            Some(Box::new(callback)),
        )
    }
}

impl<C: Channel> Inner<C> {
    fn dispatch(
        &self,
        destination: Destination,
        content: Bytes,
        options: PublishOptions,
        callback: Option<WriteCallback>,
    ) -> Result<(), PublisherError> {
        let guard = self.gate.lock();
        let channel = match &mut *guard.borrow_mut() {
            Gate::Buffering(pending) => {
                pending.push_back(PendingMessage {
                    destination,
                    content,
                    options,
                    callback,
                });
                debug!(target: TARGET, pending = pending.len(), "Channel not ready. Message buffered");
                return Ok(());
            }
            Gate::Ready(channel) => Arc::clone(channel),
        };

        self.forward(&channel, destination, content, &options, callback)
    }

    /// Hands one message to the channel. Caller holds the gate.
    fn forward(
        &self,
        channel: &C,
        destination: Destination,
        content: Bytes,
        options: &PublishOptions,
        callback: Option<WriteCallback>,
    ) -> Result<(), PublisherError> {
        let resolved = self.options.merge(options);
        let generation = self.drain_generation.load(Ordering::SeqCst);

        let accepted = match &destination {
            Destination::Exchange => channel.publish(
                &resolved.exchange_name,
                &resolved.routing_key,
                content,
                &resolved.channel_options,
            ),
            Destination::Queue(queue) => {
                channel.send_to_queue(queue, content, &resolved.channel_options)
            }
        }
        .map_err(PublisherError::channel)?;

        trace!(
            target: TARGET,
            destination = ?destination,
            exchange = %resolved.exchange_name,
            routing_key = %resolved.routing_key,
            accepted,
            "Forwarded to channel"
        );

        if let Some(callback) = callback {
            if accepted {
                self.scheduler.defer(callback);
            } else {
                self.write_callbacks.lock().push_back(callback);
                // A drain that fired during the call found the queue
                // without this callback.
                if self.drain_generation.load(Ordering::SeqCst) != generation {
                    self.release_write_callbacks();
                }
            }
        }
        Ok(())
    }

    fn on_ready(self: &Arc<Self>, channel: Arc<C>) -> Result<(), PublisherError> {
        let guard = self.gate.lock();
        let backlog = {
            let mut gate = guard.borrow_mut();
            match std::mem::replace(&mut *gate, Gate::Ready(Arc::clone(&channel))) {
                Gate::Buffering(pending) => pending,
                // The listener is FnOnce and registered once, so this arm is
                // never taken; the first channel stays.
                Gate::Ready(current) => {
                    *gate = Gate::Ready(current);
                    return Ok(());
                }
            }
        };

        let weak = Arc::downgrade(self);
        channel.on_drain(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.release_write_callbacks();
            }
        }));

        debug!(target: TARGET, backlog = backlog.len(), "Channel ready. Flushing buffered messages");
        self.flush(&channel, backlog)
    }

    /// Replays the backlog in call order. The first failure aborts the flush
    /// and whatever is left is dropped.
    fn flush(&self, channel: &C, mut backlog: VecDeque<PendingMessage>) -> Result<(), PublisherError> {
        while let Some(message) = backlog.pop_front() {
            if let Err(err) = self.forward(
                channel,
                message.destination,
                message.content,
                &message.options,
                message.callback,
            ) {
                error!(target: TARGET, dropped = backlog.len(), error = %err, "Flush aborted");
                return Err(err);
            }
        }
        Ok(())
    }

    fn release_write_callbacks(&self) {
        self.drain_generation.fetch_add(1, Ordering::SeqCst);
        let batch = std::mem::take(&mut *self.write_callbacks.lock());
        if batch.is_empty() {
            return;
        }

        debug!(target: TARGET, callbacks = batch.len(), "Channel drained. Releasing write callbacks");
        for callback in batch {
            callback();
        }
    }
}
