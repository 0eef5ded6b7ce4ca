//! Error taxonomy for the ingestion pipeline and the read path.

use thiserror::Error;

use crate::validation::ValidationError;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The inbound payload could not be parsed into the order shape.
    /// Terminal for the message.
    #[error("malformed order payload: {0}")]
    Decode(String),

    /// The order violates a business rule. Terminal for the message; the
    /// reason is surfaced to the operator.
    #[error("order rejected: {0}")]
    Validation(#[from] ValidationError),

    /// The store could not durably write or read. Recoverable by bus
    /// redelivery: the message is left unacknowledged.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// Stored rows for an order are missing mandatory parts. A validated
    /// order always has a delivery, a payment, and at least one item, so a
    /// partial read is corruption, not a tolerable state.
    #[error("data integrity violation: {0}")]
    Integrity(String),

    /// Consumption progress could not be committed to the bus. Logged and
    /// absorbed; idempotent persistence makes the redelivery safe.
    #[error("acknowledge failed: {0}")]
    Acknowledge(String),

    /// No order exists under the requested identifier.
    #[error("order not found: {0}")]
    NotFound(String),
}
