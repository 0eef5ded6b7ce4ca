//! Read-through lookup path.

use orderpipe_core::cache::OrderCache;
use orderpipe_core::error::OrderError;
use orderpipe_core::model::Order;
use orderpipe_core::repository::OrderRepository;

/// Looks up one order: cache first, store on miss, populating the cache on a
/// store hit. Not-found results are never cached, so repeated lookups of a
/// nonexistent uid always reach the store.
///
/// # Errors
///
/// Returns [`OrderError::NotFound`] when neither the cache nor the store
/// holds the order, and whatever the store surfaces on a failed read.
pub async fn get_order(
    order_uid: &str,
    cache: &dyn OrderCache,
    repository: &dyn OrderRepository,
) -> Result<Order, OrderError> {
    if let Some(order) = cache.get(order_uid) {
        return Ok(order);
    }
    tracing::debug!(order_uid, "cache miss, falling back to store");

    let order = repository.load_by_uid(order_uid).await?;
    cache.put(order.clone());
    Ok(order)
}
