//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use orderpipe_core::cache::{InMemoryOrderCache, OrderCache};
use orderpipe_core::repository::OrderRepository;
use orderpipe_store::PgOrderRepository;
use sqlx::PgPool;
use tower::ServiceExt;

use orderpipe_api::routes;
use orderpipe_api::state::AppState;

/// Handles to the live parts of a test app, for asserting on cache and store
/// state behind the HTTP surface.
pub struct TestApp {
    pub router: Router,
    pub cache: Arc<InMemoryOrderCache>,
    pub repository: Arc<PgOrderRepository>,
}

/// Build the full app router over a real `PgOrderRepository` and a fresh
/// cache. Uses the same route structure as `main.rs`.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let cache = Arc::new(InMemoryOrderCache::new());
    let repository = Arc::new(PgOrderRepository::new(pool));
    let app_state = AppState::new(
        Arc::clone(&cache) as Arc<dyn OrderCache>,
        Arc::clone(&repository) as Arc<dyn OrderRepository>,
    );

    let router = Router::new()
        .merge(routes::health::router())
        .merge(routes::order::router())
        .with_state(app_state);

    TestApp {
        router,
        cache,
        repository,
    }
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
