//! Orderpipe service entry point.
//!
//! Boot order: connect the store, warm the cache from it, start the
//! ingestion pipeline (bus reader pump into the bounded queue, single
//! worker draining it), then serve the lookup API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use orderpipe_api::config::AppConfig;
use orderpipe_api::error::AppError;
use orderpipe_api::state::AppState;
use orderpipe_api::{generator, routes};
use orderpipe_core::cache::{InMemoryOrderCache, OrderCache};
use orderpipe_core::clock::SystemClock;
use orderpipe_core::repository::OrderRepository;
use orderpipe_pipeline::memory::InMemoryBus;
use orderpipe_pipeline::worker::Worker;
use orderpipe_pipeline::{queue, reader};
use orderpipe_store::PgOrderRepository;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("starting orderpipe service");

    let config = AppConfig::from_env()?;

    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    let repository: Arc<dyn OrderRepository> = Arc::new(PgOrderRepository::new(pool));
    let cache: Arc<dyn OrderCache> = Arc::new(InMemoryOrderCache::new());

    // Warm the cache; a failure here degrades to a cold start, not an abort.
    match repository.load_all().await {
        Ok(orders) => {
            let count = orders.len();
            cache.bulk_load(orders);
            tracing::info!(orders = count, "cache warmed from store");
        }
        Err(err) => tracing::warn!(%err, "warm load failed, starting with a cold cache"),
    }

    // The external broker client is an integration point; an in-memory bus
    // stands in for it and feeds the same ports.
    let (bus, source) = InMemoryBus::new(&config.bus_topic);
    let (producer, consumer) = queue::bounded(config.queue_capacity);
    tokio::spawn(reader::pump(source, producer));

    let worker = Worker::new(
        Arc::clone(&repository),
        Arc::clone(&cache),
        Arc::new(bus.committer()),
        Arc::new(SystemClock),
    );
    tokio::spawn(async move { worker.run(consumer).await });

    if let Some(interval) = config.generator_interval {
        tokio::spawn(generator::run(bus.clone(), interval));
    }

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::order::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(cache, repository));

    // Start server.
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|err| AppError::Config(format!("invalid HOST:PORT combination: {err}")))?;
    tracing::info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
