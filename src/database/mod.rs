/// Durable store integration
///
/// This module provides:
/// - Connection pooling and embedded migrations for PostgreSQL
/// - Repository traits for assets and prices, with Diesel implementations
/// - An in-memory store implementing the same traits, used when no database is configured

pub mod connection;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod schema;

pub use connection::{establish_connection_pool, run_migrations, DatabaseError, PgPool};
pub use memory::InMemoryStore;
pub use models::{Asset, PriceRecord, SaveOutcome};
pub use repositories::{AssetRepository, PriceRepository};
