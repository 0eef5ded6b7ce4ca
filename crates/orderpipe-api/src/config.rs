//! Environment-based service configuration.

use std::time::Duration;

use orderpipe_pipeline::queue::DEFAULT_QUEUE_CAPACITY;

use crate::error::AppError;

/// Configuration collected from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` connection string (`DATABASE_URL`, required).
    pub database_url: String,
    /// Bind host (`HOST`, default `0.0.0.0`).
    pub host: String,
    /// Bind port (`PORT`, default `3000`).
    pub port: u16,
    /// Bus topic name (`BUS_TOPIC`, default `orders`).
    pub bus_topic: String,
    /// Ingest queue capacity (`INGEST_QUEUE_CAPACITY`, default 50).
    pub queue_capacity: usize,
    /// Interval between synthetic orders (`GENERATOR_INTERVAL_MS`); the
    /// generator stays off when unset.
    pub generator_interval: Option<Duration>,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when `DATABASE_URL` is missing or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL must be set".to_owned()))?;
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_owned());
        let port = parse_or("PORT", 3000_u16)?;
        let bus_topic = std::env::var("BUS_TOPIC").unwrap_or_else(|_| "orders".to_owned());
        let queue_capacity = parse_or("INGEST_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?;
        let generator_interval = match std::env::var("GENERATOR_INTERVAL_MS") {
            Ok(raw) => Some(Duration::from_millis(raw.parse().map_err(|err| {
                AppError::Config(format!("GENERATOR_INTERVAL_MS must be an integer: {err}"))
            })?)),
            Err(_) => None,
        };

        Ok(Self {
            database_url,
            host,
            port,
            bus_topic,
            queue_capacity,
            generator_interval,
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|err| AppError::Config(format!("{name} must be a valid value: {err}"))),
        Err(_) => Ok(default),
    }
}
