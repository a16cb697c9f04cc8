#![allow(dead_code)]

use blipmq_publisher::{
    Channel, ChannelClient, ChannelOptions, DrainListener, PublisherError, ReadyListener,
    Scheduler, WriteCallback,
};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Once};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = blipmq_publisher::logging::init_logging();
    });
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Publish {
        exchange: String,
        routing_key: String,
        content: Bytes,
        options: ChannelOptions,
    },
    SendToQueue {
        queue: String,
        content: Bytes,
        options: ChannelOptions,
    },
}

impl Call {
    pub fn content(&self) -> &Bytes {
        match self {
            Call::Publish { content, .. } | Call::SendToQueue { content, .. } => content,
        }
    }
}

#[derive(Debug)]
pub struct ChannelClosed;

impl fmt::Display for ChannelClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel closed")
    }
}

impl std::error::Error for ChannelClosed {}

/// Records every primitive call. Replies `true` unless told otherwise.
#[derive(Default)]
pub struct MockChannel {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<VecDeque<bool>>,
    fail_at: Mutex<Option<usize>>,
    drain_inside_next_call: Mutex<bool>,
    drain_listeners: Mutex<Vec<DrainListener>>,
}

impl MockChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues the next replies; once used up, writes are accepted again.
    pub fn reply(&self, accepted: &[bool]) {
        self.replies.lock().extend(accepted.iter().copied());
    }

    /// Makes the call arriving when `n` calls have been recorded fail, once.
    pub fn fail_at(&self, n: usize) {
        *self.fail_at.lock() = Some(n);
    }

    /// Fires the drain event from inside the next primitive call, before it
    /// returns.
    pub fn drain_inside_next_call(&self) {
        *self.drain_inside_next_call.lock() = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn drain_listener_count(&self) -> usize {
        self.drain_listeners.lock().len()
    }

    pub fn fire_drain(&self) {
        for listener in self.drain_listeners.lock().iter() {
            listener();
        }
    }

    fn record(&self, call: Call) -> Result<bool, ChannelClosed> {
        let accepted = {
            let mut calls = self.calls.lock();
            let mut fail_at = self.fail_at.lock();
            if *fail_at == Some(calls.len()) {
                *fail_at = None;
                return Err(ChannelClosed);
            }
            calls.push(call);
            self.replies.lock().pop_front().unwrap_or(true)
        };

        if std::mem::take(&mut *self.drain_inside_next_call.lock()) {
            self.fire_drain();
        }
        Ok(accepted)
    }
}

impl Channel for MockChannel {
    type Error = ChannelClosed;

    fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        content: Bytes,
        options: &ChannelOptions,
    ) -> Result<bool, Self::Error> {
        self.record(Call::Publish {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            content,
            options: options.clone(),
        })
    }

    fn send_to_queue(
        &self,
        queue: &str,
        content: Bytes,
        options: &ChannelOptions,
    ) -> Result<bool, Self::Error> {
        self.record(Call::SendToQueue {
            queue: queue.to_string(),
            content,
            options: options.clone(),
        })
    }

    fn on_drain(&self, listener: DrainListener) {
        self.drain_listeners.lock().push(listener);
    }
}

/// Holds the readiness listener until the test triggers it.
pub struct MockClient {
    listener: Mutex<Option<ReadyListener<MockChannel>>>,
    accepts_listener: bool,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            listener: Mutex::new(None),
            accepts_listener: true,
        }
    }

    pub fn without_ready_hook() -> Self {
        Self {
            listener: Mutex::new(None),
            accepts_listener: false,
        }
    }

    pub fn trigger_ready(&self, channel: Arc<MockChannel>) -> Result<(), PublisherError> {
        let listener = self
            .listener
            .lock()
            .take()
            .expect("no readiness listener registered");
        listener(channel)
    }
}

impl ChannelClient for MockClient {
    type Channel = MockChannel;

    fn add_ready_listener(
        &self,
        listener: ReadyListener<MockChannel>,
    ) -> Result<(), ReadyListener<MockChannel>> {
        if !self.accepts_listener {
            return Err(listener);
        }
        *self.listener.lock() = Some(listener);
        Ok(())
    }
}

/// Collects deferred callbacks until `run_pending` is called.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    tasks: Arc<Mutex<VecDeque<WriteCallback>>>,
}

impl ManualScheduler {
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn run_pending(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task();
        }
    }
}

impl Scheduler for ManualScheduler {
    fn defer(&self, task: WriteCallback) {
        self.tasks.lock().push_back(task);
    }
}

/// Shared, ordered log of which callbacks ran.
#[derive(Clone, Default)]
pub struct CallbackLog(Arc<Mutex<Vec<&'static str>>>);

impl CallbackLog {
    pub fn callback(&self, name: &'static str) -> impl FnOnce() + Send + 'static {
        let log = Arc::clone(&self.0);
        move || log.lock().push(name)
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.0.lock().clone()
    }
}
