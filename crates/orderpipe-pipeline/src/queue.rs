//! Bounded hand-off queue between the bus reader and the worker.
//!
//! Single producer, single consumer, arrival order preserved. A full queue
//! suspends the producer — the system's only backpressure point, pushing
//! stall pressure back to the bus reader instead of buffering unboundedly. No
//! timeout is imposed on suspension; the bus reader's own read timeout
//! governs liveness.

use thiserror::Error;
use tokio::sync::mpsc;

use orderpipe_core::bus::InboundMessage;

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

/// The consumer half was dropped; no further messages can be handed off.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("ingest queue closed")]
pub struct QueueClosed;

/// Creates a bounded queue of the given capacity.
///
/// # Panics
///
/// Panics if `capacity` is zero.
#[must_use]
pub fn bounded(capacity: usize) -> (QueueProducer, QueueConsumer) {
    let (tx, rx) = mpsc::channel(capacity);
    (QueueProducer { tx }, QueueConsumer { rx })
}

/// Producer half; held by the bus reader pump.
#[derive(Debug, Clone)]
pub struct QueueProducer {
    tx: mpsc::Sender<InboundMessage>,
}

impl QueueProducer {
    /// Enqueues one message, suspending while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`QueueClosed`] when the consumer half has been dropped.
    pub async fn enqueue(&self, message: InboundMessage) -> Result<(), QueueClosed> {
        self.tx.send(message).await.map_err(|_| QueueClosed)
    }
}

/// Consumer half; held by the worker.
#[derive(Debug)]
pub struct QueueConsumer {
    rx: mpsc::Receiver<InboundMessage>,
}

impl QueueConsumer {
    /// Dequeues the next message in arrival order, suspending while the
    /// queue is empty. `None` means the producer half has been dropped and
    /// the queue drained.
    pub async fn dequeue(&mut self) -> Option<InboundMessage> {
        self.rx.recv().await
    }
}
