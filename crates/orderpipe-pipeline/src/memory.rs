//! In-memory message bus.
//!
//! Implements the bus ports with sequential offsets on a single logical
//! partition and a committed watermark. It stands in for the external broker
//! client in the service entry point and backs the pipeline's integration
//! tests; the bounded ingest queue downstream provides the backpressure, so
//! the bus log itself is unbounded like a real broker's.
//!
//! The publish handle owns the log's sender: dropping every [`InMemoryBus`]
//! clone ends the subscription. The committer handle shares only the
//! watermark, so the worker holding it does not keep the log alive.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use orderpipe_core::bus::{BusError, InboundMessage, MessageMarker, MessageSource, OffsetCommitter};
use orderpipe_core::error::OrderError;

#[derive(Debug)]
struct BusShared {
    topic: String,
    next_offset: AtomicI64,
    committed: AtomicI64,
}

/// Publish handle of the in-memory bus. Cloneable; all clones append to the
/// same log.
#[derive(Debug, Clone)]
pub struct InMemoryBus {
    shared: Arc<BusShared>,
    tx: mpsc::UnboundedSender<InboundMessage>,
}

/// Acknowledging handle; shares the watermark with the bus.
#[derive(Debug, Clone)]
pub struct InMemoryBusCommitter {
    shared: Arc<BusShared>,
}

/// Receiving half; single consumer, created together with the bus.
#[derive(Debug)]
pub struct InMemoryBusSource {
    rx: mpsc::UnboundedReceiver<InboundMessage>,
}

impl InMemoryBus {
    /// Creates a bus for `topic` and its single subscription.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> (Self, InMemoryBusSource) {
        let (tx, rx) = mpsc::unbounded_channel();
        let bus = Self {
            shared: Arc::new(BusShared {
                topic: topic.into(),
                next_offset: AtomicI64::new(0),
                committed: AtomicI64::new(-1),
            }),
            tx,
        };
        (bus, InMemoryBusSource { rx })
    }

    /// Appends one payload to the log, returning its marker. Publishing
    /// after the subscription ended still assigns an offset; the message is
    /// simply never received.
    pub fn publish(&self, payload: Vec<u8>) -> MessageMarker {
        let offset = self.shared.next_offset.fetch_add(1, Ordering::SeqCst);
        let marker = MessageMarker {
            topic: self.shared.topic.clone(),
            partition: 0,
            offset,
        };
        let _ = self.tx.send(InboundMessage {
            marker: marker.clone(),
            payload,
        });
        marker
    }

    /// Returns an acknowledging handle for the worker.
    #[must_use]
    pub fn committer(&self) -> InMemoryBusCommitter {
        InMemoryBusCommitter {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Highest committed offset, or `None` before the first commit.
    #[must_use]
    pub fn committed_offset(&self) -> Option<i64> {
        committed_offset(&self.shared)
    }
}

impl InMemoryBusCommitter {
    /// Highest committed offset, or `None` before the first commit.
    #[must_use]
    pub fn committed_offset(&self) -> Option<i64> {
        committed_offset(&self.shared)
    }
}

fn committed_offset(shared: &BusShared) -> Option<i64> {
    let committed = shared.committed.load(Ordering::SeqCst);
    (committed >= 0).then_some(committed)
}

#[async_trait]
impl OffsetCommitter for InMemoryBusCommitter {
    async fn commit(&self, marker: &MessageMarker) -> Result<(), OrderError> {
        self.shared.committed.fetch_max(marker.offset, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl MessageSource for InMemoryBusSource {
    async fn receive(&mut self) -> Result<Option<InboundMessage>, BusError> {
        Ok(self.rx.recv().await)
    }
}
