//! In-process message bus.
//!
//! Each subscription owns an unbounded `tokio::sync::mpsc` channel. Publishing
//! fans the message out to every subscription whose pattern matches the
//! topic. Subscriptions whose receiver has been dropped are pruned on the
//! next publish.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::trace;

use super::topics::{is_valid_publish_topic, topic_matches};
use super::{BusError, InboundMessage, Publisher};
use crate::store::BoxFuture;

struct Subscription {
    pattern: String,
    tx: mpsc::UnboundedSender<InboundMessage>,
}

/// Topic-routed broker living inside the process.
#[derive(Default)]
pub struct MemoryBus {
    subscriptions: Mutex<Vec<Subscription>>,
    closed: AtomicBool,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every topic matching `pattern`.
    pub fn subscribe(
        &self,
        pattern: impl Into<String>,
    ) -> Result<mpsc::UnboundedReceiver<InboundMessage>, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(BusError::InvalidTopic(pattern));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.subscriptions.lock().push(Subscription { pattern, tx });
        Ok(rx)
    }

    /// Close the bus. Receivers drain what was already delivered and then
    /// observe end-of-stream; further publishes fail.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.subscriptions.lock().clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    fn deliver(&self, topic: &str, payload: Vec<u8>) -> Result<usize, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        if !is_valid_publish_topic(topic) {
            return Err(BusError::InvalidTopic(topic.to_string()));
        }

        let mut delivered = 0;
        self.subscriptions.lock().retain(|sub| {
            if !topic_matches(&sub.pattern, topic) {
                return !sub.tx.is_closed();
            }
            let message = InboundMessage::new(topic, payload.clone());
            match sub.tx.send(message) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });

        trace!(topic, delivered, "Message published");
        Ok(delivered)
    }
}

impl Publisher for MemoryBus {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> BoxFuture<'_, Result<(), BusError>> {
        let result = self.deliver(topic, payload).map(|_| ());
        Box::pin(async move { result })
    }
}
