//! Publish/subscribe transport collaborator.
//!
//! The listener consumes [`InboundMessage`]s from any channel and sends
//! acknowledgements through a [`Publisher`]. [`MemoryBus`] implements both
//! sides in-process; a network broker client plugs in behind the same trait.

mod memory;
mod topics;

pub use memory::MemoryBus;
pub use topics::{is_valid_publish_topic, topic_matches, TopicScheme, DEFAULT_TOPIC_PREFIX};

use thiserror::Error;

use crate::store::BoxFuture;

/// Errors that can occur on the message bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus no longer accepts messages.
    #[error("Message bus is closed")]
    Closed,

    /// The topic is empty or contains wildcards where none are allowed.
    #[error("Invalid topic: '{0}'")]
    InvalidTopic(String),

    /// The payload could not be encoded.
    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A message delivered from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Concrete topic the message was published on.
    pub topic: String,
    /// Raw message body.
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// Outbound side of the transport.
pub trait Publisher: Send + Sync {
    /// Publish `payload` on a concrete (wildcard-free) topic.
    fn publish(&self, topic: &str, payload: Vec<u8>) -> BoxFuture<'_, Result<(), BusError>>;
}
