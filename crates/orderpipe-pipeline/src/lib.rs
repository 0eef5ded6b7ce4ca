//! Orderpipe Pipeline — the ingestion-and-consistency core.
//!
//! Messages flow from the bus reader through a bounded hand-off queue into a
//! single sequential worker that validates, persists, caches, and finally
//! acknowledges each one. The read path serves lookups concurrently from the
//! cache with fallback to the store.

pub mod memory;
pub mod queue;
pub mod read;
pub mod reader;
pub mod worker;
