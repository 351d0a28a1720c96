// ABOUTME: Mutable fixture state: the pending message queue and the injectable datafeed failures
// ABOUTME: Reads drain the queue in one swap so every message is delivered at most once

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::events::FixtureEvent;
use crate::fixtures::DATAFEED_ID;
use crate::message::{DatafeedEvent, SymphonyMessage};

/// Result of a datafeed creation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// An injected failure was consumed
    Failed,
    Created(String),
}

/// Result of a datafeed read call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// An injected failure was consumed; the queue is untouched
    Failed,
    /// Nothing pending
    Empty,
    Messages(Vec<DatafeedEvent>),
}

/// Queue and fault counters behind the agent endpoints
pub struct DatafeedState {
    datafeed_id: String,
    messages: Mutex<Vec<SymphonyMessage>>,
    create_failures: AtomicU32,
    read_failures: AtomicU32,
    events: broadcast::Sender<FixtureEvent>,
}

impl DatafeedState {
    pub fn new(start_with_hello_world: bool) -> Self {
        let (events, _) = broadcast::channel(256);
        let messages = if start_with_hello_world {
            vec![SymphonyMessage::hello_world()]
        } else {
            Vec::new()
        };
        Self {
            datafeed_id: DATAFEED_ID.to_string(),
            messages: Mutex::new(messages),
            create_failures: AtomicU32::new(0),
            read_failures: AtomicU32::new(0),
            events,
        }
    }

    pub fn datafeed_id(&self) -> &str {
        &self.datafeed_id
    }

    /// Make the next `count` creation calls fail
    pub fn set_create_failures(&self, count: u32) {
        self.create_failures.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` read calls fail
    pub fn set_read_failures(&self, count: u32) {
        self.read_failures.store(count, Ordering::SeqCst);
    }

    pub fn remaining_create_failures(&self) -> u32 {
        self.create_failures.load(Ordering::SeqCst)
    }

    pub fn remaining_read_failures(&self) -> u32 {
        self.read_failures.load(Ordering::SeqCst)
    }

    /// Number of messages waiting for the next read
    pub fn pending(&self) -> usize {
        self.lock_messages().len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FixtureEvent> {
        self.events.subscribe()
    }

    /// Append a message and notify subscribers
    pub fn receive(&self, msg: SymphonyMessage) {
        tracing::debug!(
            message_id = %msg.message_id,
            body = %msg.message,
            "Received message"
        );
        self.lock_messages().push(msg.clone());
        // No subscribers is fine
        let _ = self.events.send(FixtureEvent::MessageReceived(msg));
    }

    pub fn create(&self) -> CreateOutcome {
        if consume_failure(&self.create_failures) {
            tracing::debug!("Injected datafeed create failure");
            return CreateOutcome::Failed;
        }
        CreateOutcome::Created(self.datafeed_id.clone())
    }

    pub fn read(&self) -> ReadOutcome {
        if consume_failure(&self.read_failures) {
            tracing::debug!("Injected datafeed read failure");
            return ReadOutcome::Failed;
        }
        let drained = std::mem::take(&mut *self.lock_messages());
        if drained.is_empty() {
            return ReadOutcome::Empty;
        }
        tracing::debug!(count = drained.len(), "Delivering queued messages");
        ReadOutcome::Messages(drained.into_iter().map(DatafeedEvent::from).collect())
    }

    fn lock_messages(&self) -> std::sync::MutexGuard<'_, Vec<SymphonyMessage>> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Decrement a failure counter if it is positive. Returns true when a
/// failure was consumed.
fn consume_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}
