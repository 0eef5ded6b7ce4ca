//! In-process order cache.
//!
//! The worker writes after every durable persist and the read path reads and
//! occasionally writes concurrently, so every access goes through the guard;
//! the backing map is never exposed.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::model::Order;

/// Port for the order cache.
///
/// The store is the system of record; the cache is a pure accelerator with no
/// eviction, TTL, or size bound.
pub trait OrderCache: Send + Sync {
    /// Returns a clone of the cached order, if present.
    fn get(&self, order_uid: &str) -> Option<Order>;

    /// Inserts or overwrites one order.
    fn put(&self, order: Order);

    /// Replaces cached entries with the given set; used once at startup from
    /// the store's bulk read.
    fn bulk_load(&self, orders: Vec<Order>);

    /// Number of cached orders.
    fn len(&self) -> usize;

    /// Whether the cache holds no orders.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`OrderCache`] backed by a lock-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryOrderCache {
    entries: RwLock<HashMap<String, Order>>,
}

impl InMemoryOrderCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderCache for InMemoryOrderCache {
    fn get(&self, order_uid: &str) -> Option<Order> {
        self.entries
            .read()
            .expect("order cache lock poisoned")
            .get(order_uid)
            .cloned()
    }

    fn put(&self, order: Order) {
        self.entries
            .write()
            .expect("order cache lock poisoned")
            .insert(order.order_uid.clone(), order);
    }

    fn bulk_load(&self, orders: Vec<Order>) {
        let mut entries = self.entries.write().expect("order cache lock poisoned");
        for order in orders {
            entries.insert(order.order_uid.clone(), order);
        }
    }

    fn len(&self) -> usize {
        self.entries.read().expect("order cache lock poisoned").len()
    }
}
