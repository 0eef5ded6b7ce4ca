//! Order repository abstraction.

use async_trait::async_trait;

use crate::error::OrderError;
use crate::model::Order;

/// Port for durable order storage.
///
/// Implementations decompose the aggregate across the normalized schema and
/// reconstruct it on read.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists the full aggregate as one atomic unit: every row commits
    /// together or none do. Idempotent — re-persisting an already-stored
    /// order, item, or association key is a silent no-op that keeps the
    /// existing rows.
    async fn persist(&self, order: &Order) -> Result<(), OrderError>;

    /// Loads one aggregate by uid, items ordered by catalog id then rid.
    ///
    /// Returns [`OrderError::NotFound`] when no such order exists and
    /// [`OrderError::Integrity`] when the order row is present but its
    /// mandatory delivery, payment, or item rows are missing.
    async fn load_by_uid(&self, order_uid: &str) -> Result<Order, OrderError>;

    /// Loads every stored aggregate, ordered by uid. Used once at startup to
    /// warm the cache.
    async fn load_all(&self) -> Result<Vec<Order>, OrderError>;
}
