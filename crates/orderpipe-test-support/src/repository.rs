//! Test repositories — in-memory `OrderRepository` implementations.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use orderpipe_core::error::OrderError;
use orderpipe_core::model::Order;
use orderpipe_core::repository::OrderRepository;

/// An order repository backed by a map, with the same idempotent
/// keep-existing semantics as the real store: re-persisting a uid keeps the
/// first payload. Records every lookup and allows injecting a persistence
/// failure for selected uids.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<BTreeMap<String, Order>>,
    loaded_uids: Mutex<Vec<String>>,
    fail_uids: Mutex<HashSet<String>>,
}

impl InMemoryOrderRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-seeded with the given orders.
    #[must_use]
    pub fn with_orders(orders: Vec<Order>) -> Self {
        let repo = Self::new();
        {
            let mut stored = repo.orders.lock().unwrap();
            for order in orders {
                stored.insert(order.order_uid.clone(), order);
            }
        }
        repo
    }

    /// Makes every subsequent `persist` of `order_uid` fail with a
    /// persistence error.
    pub fn fail_uid(&self, order_uid: &str) {
        self.fail_uids.lock().unwrap().insert(order_uid.to_owned());
    }

    /// Returns a clone of the stored order, if any, without recording a
    /// lookup.
    #[must_use]
    pub fn stored(&self, order_uid: &str) -> Option<Order> {
        self.orders.lock().unwrap().get(order_uid).cloned()
    }

    /// Number of stored orders.
    #[must_use]
    pub fn stored_len(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    /// Every uid passed to `load_by_uid`, in call order.
    #[must_use]
    pub fn loaded_uids(&self) -> Vec<String> {
        self.loaded_uids.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn persist(&self, order: &Order) -> Result<(), OrderError> {
        if self.fail_uids.lock().unwrap().contains(&order.order_uid) {
            return Err(OrderError::Persistence("injected store failure".to_owned()));
        }
        self.orders
            .lock()
            .unwrap()
            .entry(order.order_uid.clone())
            .or_insert_with(|| order.clone());
        Ok(())
    }

    async fn load_by_uid(&self, order_uid: &str) -> Result<Order, OrderError> {
        self.loaded_uids.lock().unwrap().push(order_uid.to_owned());
        self.orders
            .lock()
            .unwrap()
            .get(order_uid)
            .cloned()
            .ok_or_else(|| OrderError::NotFound(order_uid.to_owned()))
    }

    async fn load_all(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.lock().unwrap().values().cloned().collect())
    }
}

/// An order repository that always fails with a persistence error. Useful
/// for store-outage scenarios.
#[derive(Debug, Default)]
pub struct FailingOrderRepository;

#[async_trait]
impl OrderRepository for FailingOrderRepository {
    async fn persist(&self, _order: &Order) -> Result<(), OrderError> {
        Err(OrderError::Persistence("connection refused".to_owned()))
    }

    async fn load_by_uid(&self, _order_uid: &str) -> Result<Order, OrderError> {
        Err(OrderError::Persistence("connection refused".to_owned()))
    }

    async fn load_all(&self) -> Result<Vec<Order>, OrderError> {
        Err(OrderError::Persistence("connection refused".to_owned()))
    }
}
