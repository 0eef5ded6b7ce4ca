//! Shared application state.

use std::sync::Arc;

use orderpipe_core::cache::OrderCache;
use orderpipe_core::repository::OrderRepository;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// In-process order cache, shared with the worker.
    pub cache: Arc<dyn OrderCache>,
    /// Durable order store.
    pub repository: Arc<dyn OrderRepository>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(cache: Arc<dyn OrderCache>, repository: Arc<dyn OrderRepository>) -> Self {
        Self { cache, repository }
    }
}
