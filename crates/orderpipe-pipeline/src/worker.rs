//! The processing worker: a per-message state machine.
//!
//! Each message advances through decode, validate, persist, cache, and
//! acknowledge, strictly in that order and strictly one message at a time.
//! The ordering carries the pipeline's two consistency rules: the cache is
//! written only after the store write commits (the cache never leads the
//! store), and consumption progress is committed only after both (a message
//! that failed to persist will be redelivered).

use std::sync::Arc;

use orderpipe_core::bus::{InboundMessage, MessageMarker, OffsetCommitter};
use orderpipe_core::cache::OrderCache;
use orderpipe_core::clock::Clock;
use orderpipe_core::model::Order;
use orderpipe_core::repository::OrderRepository;
use orderpipe_core::validation::validate;

use crate::queue::QueueConsumer;

/// Terminal state of one processed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Persisted, cached, and acknowledged.
    Completed,
    /// Dropped as unprocessable (decode or validation failure) and
    /// acknowledged so the bus does not redeliver a poison message.
    Rejected,
    /// The store write failed; left unacknowledged for redelivery.
    Deferred,
}

/// Single logical consumer of the ingest queue.
pub struct Worker {
    repository: Arc<dyn OrderRepository>,
    cache: Arc<dyn OrderCache>,
    committer: Arc<dyn OffsetCommitter>,
    clock: Arc<dyn Clock>,
}

impl Worker {
    /// Creates a worker over the given ports.
    #[must_use]
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        cache: Arc<dyn OrderCache>,
        committer: Arc<dyn OffsetCommitter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            cache,
            committer,
            clock,
        }
    }

    /// Drains the queue until it closes. No message error terminates this
    /// loop; its liveness is itself a correctness property.
    pub async fn run(&self, mut queue: QueueConsumer) {
        while let Some(message) = queue.dequeue().await {
            let outcome = self.process(&message).await;
            tracing::debug!(
                offset = message.marker.offset,
                ?outcome,
                "message processed"
            );
        }
        tracing::info!("ingest queue drained and closed, stopping worker");
    }

    /// Advances one message through the full state machine.
    pub async fn process(&self, message: &InboundMessage) -> MessageOutcome {
        let order: Order = match serde_json::from_slice(&message.payload) {
            Ok(order) => order,
            Err(err) => {
                tracing::warn!(
                    offset = message.marker.offset,
                    %err,
                    "dropping malformed message"
                );
                self.acknowledge_rejected(&message.marker).await;
                return MessageOutcome::Rejected;
            }
        };

        if let Err(err) = validate(&order, self.clock.now()) {
            tracing::warn!(order_uid = %order.order_uid, %err, "dropping invalid order");
            self.acknowledge_rejected(&message.marker).await;
            return MessageOutcome::Rejected;
        }

        if let Err(err) = self.repository.persist(&order).await {
            tracing::error!(
                order_uid = %order.order_uid,
                %err,
                "persist failed, leaving message unacknowledged for redelivery"
            );
            return MessageOutcome::Deferred;
        }

        // Durable write committed; the cache update cannot fail the pipeline.
        self.cache.put(order.clone());

        if let Err(err) = self.committer.commit(&message.marker).await {
            tracing::warn!(
                order_uid = %order.order_uid,
                %err,
                "acknowledge failed, message may be redelivered"
            );
        }

        MessageOutcome::Completed
    }

    async fn acknowledge_rejected(&self, marker: &MessageMarker) {
        if let Err(err) = self.committer.commit(marker).await {
            tracing::warn!(
                offset = marker.offset,
                %err,
                "acknowledge of rejected message failed, it will redeliver"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use orderpipe_core::cache::InMemoryOrderCache;
    use orderpipe_test_support::{
        FailingCommitter, FixedClock, InMemoryOrderRepository, RecordingCommitter, inbound_message,
        sample_order, sample_order_json, sample_order_with_uid,
    };

    use super::*;
    use crate::queue;

    struct Harness {
        repository: Arc<InMemoryOrderRepository>,
        cache: Arc<InMemoryOrderCache>,
        committer: Arc<RecordingCommitter>,
        worker: Worker,
    }

    /// Clock fixed to the fixture's payment day.
    fn fixed_clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2021, 11, 26, 10, 0, 0).unwrap())
    }

    fn harness() -> Harness {
        let repository = Arc::new(InMemoryOrderRepository::new());
        let cache = Arc::new(InMemoryOrderCache::new());
        let committer = Arc::new(RecordingCommitter::new());
        let worker = Worker::new(
            Arc::clone(&repository) as Arc<dyn OrderRepository>,
            Arc::clone(&cache) as Arc<dyn OrderCache>,
            Arc::clone(&committer) as Arc<dyn OffsetCommitter>,
            Arc::new(fixed_clock()),
        );
        Harness {
            repository,
            cache,
            committer,
            worker,
        }
    }

    #[tokio::test]
    async fn test_valid_order_is_persisted_cached_and_acknowledged() {
        // Arrange
        let h = harness();
        let message = inbound_message(7, sample_order_json());

        // Act
        let outcome = h.worker.process(&message).await;

        // Assert
        assert_eq!(outcome, MessageOutcome::Completed);
        let expected = sample_order();
        assert_eq!(h.repository.stored(&expected.order_uid), Some(expected.clone()));
        assert_eq!(h.cache.get(&expected.order_uid), Some(expected));
        let committed = h.committer.committed();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].offset, 7);
    }

    #[tokio::test]
    async fn test_cache_agrees_with_store_after_completion() {
        let h = harness();
        h.worker.process(&inbound_message(0, sample_order_json())).await;

        let uid = sample_order().order_uid;
        let from_store = h.repository.load_by_uid(&uid).await.unwrap();
        let from_cache = h.cache.get(&uid).unwrap();

        assert_eq!(from_cache, from_store);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_rejected_and_acknowledged() {
        let h = harness();
        let message = inbound_message(3, b"{not json".to_vec());

        let outcome = h.worker.process(&message).await;

        assert_eq!(outcome, MessageOutcome::Rejected);
        assert_eq!(h.repository.stored_len(), 0);
        assert_eq!(h.cache.len(), 0);
        // Dropped poison messages are still acknowledged.
        assert_eq!(h.committer.committed().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_order_never_reaches_store_or_cache() {
        let h = harness();
        let mut order = sample_order();
        order.items.clear();
        let message = inbound_message(4, serde_json::to_vec(&order).unwrap());

        let outcome = h.worker.process(&message).await;

        assert_eq!(outcome, MessageOutcome::Rejected);
        assert_eq!(h.repository.stored_len(), 0);
        assert_eq!(h.cache.len(), 0);
    }

    #[tokio::test]
    async fn test_persist_failure_defers_without_acknowledgment() {
        // Arrange
        let h = harness();
        let order = sample_order();
        h.repository.fail_uid(&order.order_uid);
        let message = inbound_message(5, sample_order_json());

        // Act
        let outcome = h.worker.process(&message).await;

        // Assert: no acknowledgment and no cache entry — the cache must
        // never lead the store.
        assert_eq!(outcome, MessageOutcome::Deferred);
        assert!(h.committer.committed().is_empty());
        assert_eq!(h.cache.len(), 0);
    }

    #[tokio::test]
    async fn test_worker_continues_past_a_failing_message() {
        // Arrange: first message fails at the store, second is fine.
        let h = harness();
        let poisoned = sample_order_with_uid("stuck-order");
        h.repository.fail_uid(&poisoned.order_uid);

        let first = inbound_message(1, serde_json::to_vec(&poisoned).unwrap());
        let second = inbound_message(2, sample_order_json());

        // Act
        assert_eq!(h.worker.process(&first).await, MessageOutcome::Deferred);
        assert_eq!(h.worker.process(&second).await, MessageOutcome::Completed);

        // Assert: only the healthy message advanced the offset.
        let committed = h.committer.committed();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].offset, 2);
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_a_no_op() {
        let h = harness();
        let message = inbound_message(8, sample_order_json());

        assert_eq!(h.worker.process(&message).await, MessageOutcome::Completed);
        assert_eq!(h.worker.process(&message).await, MessageOutcome::Completed);

        assert_eq!(h.repository.stored_len(), 1);
        assert_eq!(h.cache.len(), 1);
    }

    #[tokio::test]
    async fn test_acknowledge_failure_does_not_fail_the_pipeline() {
        let repository = Arc::new(InMemoryOrderRepository::new());
        let cache = Arc::new(InMemoryOrderCache::new());
        let worker = Worker::new(
            Arc::clone(&repository) as Arc<dyn OrderRepository>,
            Arc::clone(&cache) as Arc<dyn OrderCache>,
            Arc::new(FailingCommitter),
            Arc::new(fixed_clock()),
        );

        let outcome = worker.process(&inbound_message(9, sample_order_json())).await;

        // Persisted and cached; redelivery is safe because persistence is
        // idempotent.
        assert_eq!(outcome, MessageOutcome::Completed);
        assert_eq!(repository.stored_len(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_run_drains_queued_messages_in_order() {
        let h = harness();
        let (producer, consumer) = queue::bounded(8);

        let first = sample_order_with_uid("run-order-1");
        let second = sample_order_with_uid("run-order-2");
        producer
            .enqueue(inbound_message(1, serde_json::to_vec(&first).unwrap()))
            .await
            .unwrap();
        producer
            .enqueue(inbound_message(2, serde_json::to_vec(&second).unwrap()))
            .await
            .unwrap();
        drop(producer);

        h.worker.run(consumer).await;

        assert_eq!(h.repository.stored_len(), 2);
        let committed = h.committer.committed();
        assert_eq!(committed.len(), 2);
        // Acknowledgment order equals persistence order.
        assert_eq!(committed[0].offset, 1);
        assert_eq!(committed[1].offset, 2);
    }
}
