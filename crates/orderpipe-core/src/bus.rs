//! Message-bus ports.
//!
//! The bus client itself — connection, partition assignment, wire protocol —
//! is an external collaborator. The pipeline needs exactly two capabilities
//! from it: receive the next raw message, and acknowledge consumption
//! progress for a message it has durably handled.

use async_trait::async_trait;
use thiserror::Error;

use crate::error::OrderError;

/// Identifies one consumed message for later acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMarker {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// A raw, not-yet-decoded message received from the bus.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub marker: MessageMarker,
    pub payload: Vec<u8>,
}

/// Errors surfaced by the receiving side of the bus.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus unavailable: {0}")]
    Unavailable(String),
}

/// Receiving side of the bus subscription.
#[async_trait]
pub trait MessageSource: Send {
    /// Receives the next message in partition order. `Ok(None)` means the
    /// subscription ended and no further messages will arrive.
    async fn receive(&mut self) -> Result<Option<InboundMessage>, BusError>;
}

/// Acknowledging side of the bus subscription.
#[async_trait]
pub trait OffsetCommitter: Send + Sync {
    /// Marks the message as durably handled so the bus will not redeliver it.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Acknowledge`] when the bus is unreachable; the
    /// caller logs and absorbs this, accepting a possible redelivery.
    async fn commit(&self, marker: &MessageMarker) -> Result<(), OrderError>;
}
