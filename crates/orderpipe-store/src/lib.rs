//! Orderpipe Store — `PostgreSQL` implementation of the repository port.

pub mod pg_order_repository;

pub use pg_order_repository::PgOrderRepository;
