//! Shared test doubles and fixtures for the orderpipe workspace.

mod bus;
mod clock;
mod fixtures;
mod repository;

pub use bus::{FailingCommitter, RecordingCommitter, ScriptedSource, inbound_message};
pub use clock::FixedClock;
pub use fixtures::{sample_order, sample_order_json, sample_order_with_uid};
pub use repository::{FailingOrderRepository, InMemoryOrderRepository};
