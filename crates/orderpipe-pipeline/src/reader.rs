//! Bus reader pump: receives raw messages and hands them to the queue.

use orderpipe_core::bus::MessageSource;

use crate::queue::QueueProducer;

/// Pumps messages from `source` into the queue until the subscription ends
/// or the consumer side of the queue goes away. Receive errors are logged
/// and the subscription is retried; a full queue suspends this task until
/// the worker drains a slot.
pub async fn pump<S: MessageSource>(mut source: S, queue: QueueProducer) {
    loop {
        match source.receive().await {
            Ok(Some(message)) => {
                if queue.enqueue(message).await.is_err() {
                    tracing::info!("ingest queue closed, stopping bus reader");
                    return;
                }
            }
            Ok(None) => {
                tracing::info!("bus subscription ended, stopping bus reader");
                return;
            }
            Err(err) => {
                tracing::warn!(%err, "bus receive failed, retrying");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use orderpipe_test_support::{ScriptedSource, inbound_message};

    use super::*;
    use crate::queue;

    #[tokio::test]
    async fn test_pump_forwards_every_message_in_order() {
        let source = ScriptedSource::new(vec![
            inbound_message(10, b"a".to_vec()),
            inbound_message(11, b"b".to_vec()),
            inbound_message(12, b"c".to_vec()),
        ]);
        let (producer, mut consumer) = queue::bounded(8);

        pump(source, producer).await;

        for expected in 10..=12 {
            assert_eq!(consumer.dequeue().await.unwrap().marker.offset, expected);
        }
        assert!(consumer.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn test_pump_stops_when_queue_consumer_is_dropped() {
        let source = ScriptedSource::new(vec![inbound_message(0, vec![])]);
        let (producer, consumer) = queue::bounded(8);
        drop(consumer);

        // Must return rather than loop forever.
        pump(source, producer).await;
    }
}
