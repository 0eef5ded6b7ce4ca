//! Test bus doubles — scripted source and recording/failing committers.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use orderpipe_core::bus::{BusError, InboundMessage, MessageMarker, MessageSource, OffsetCommitter};
use orderpipe_core::error::OrderError;

/// Builds an inbound message on the conventional test topic.
#[must_use]
pub fn inbound_message(offset: i64, payload: Vec<u8>) -> InboundMessage {
    InboundMessage {
        marker: MessageMarker {
            topic: "orders".to_owned(),
            partition: 0,
            offset,
        },
        payload,
    }
}

/// A message source that yields a scripted sequence and then ends.
#[derive(Debug)]
pub struct ScriptedSource {
    messages: VecDeque<InboundMessage>,
}

impl ScriptedSource {
    /// Creates a source that will yield `messages` in order.
    #[must_use]
    pub fn new(messages: Vec<InboundMessage>) -> Self {
        Self {
            messages: messages.into(),
        }
    }
}

#[async_trait]
impl MessageSource for ScriptedSource {
    async fn receive(&mut self) -> Result<Option<InboundMessage>, BusError> {
        Ok(self.messages.pop_front())
    }
}

/// A committer that records every acknowledged marker and always succeeds.
/// The "no premature acknowledgment" property is asserted through it.
#[derive(Debug, Default)]
pub struct RecordingCommitter {
    committed: Mutex<Vec<MessageMarker>>,
}

impl RecordingCommitter {
    /// Creates a committer with an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every committed marker, in call order.
    #[must_use]
    pub fn committed(&self) -> Vec<MessageMarker> {
        self.committed.lock().unwrap().clone()
    }
}

#[async_trait]
impl OffsetCommitter for RecordingCommitter {
    async fn commit(&self, marker: &MessageMarker) -> Result<(), OrderError> {
        self.committed.lock().unwrap().push(marker.clone());
        Ok(())
    }
}

/// A committer that always fails, for bus-unreachable-at-commit scenarios.
#[derive(Debug, Default)]
pub struct FailingCommitter;

#[async_trait]
impl OffsetCommitter for FailingCommitter {
    async fn commit(&self, _marker: &MessageMarker) -> Result<(), OrderError> {
        Err(OrderError::Acknowledge("bus unreachable".to_owned()))
    }
}
