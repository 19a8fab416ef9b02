//! Ingestion error types.

use thiserror::Error;

use crate::bus::BusError;
use crate::store::StoreError;

/// Reasons a payload is rejected before any state is touched.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Not JSON, or a field has the wrong shape.
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A required field is absent or null.
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    /// A required text field is empty.
    #[error("Required field '{0}' is empty")]
    EmptyField(&'static str),
}

/// Failure while processing one inbound message.
///
/// Each failure is scoped to its message; none is fatal to the listener.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The payload was rejected; nothing was committed and no ack was sent.
    #[error("Malformed detection event: {0}")]
    Malformed(#[from] ParseError),

    /// A store call failed; earlier steps stay committed and no ack was sent.
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    /// The acknowledgement could not be published; all store effects stand.
    #[error("Failed to publish acknowledgement: {0}")]
    Publish(#[from] BusError),
}

impl IngestError {
    /// True for payload problems (as opposed to collaborator failures).
    pub fn is_malformed(&self) -> bool {
        matches!(self, IngestError::Malformed(_))
    }
}
