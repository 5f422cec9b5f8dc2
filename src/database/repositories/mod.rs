/// Repository traits and their Diesel implementations
///
/// Traits are synchronous; async callers run them on the blocking pool.

pub mod asset_repository;
pub mod price_repository;

pub use asset_repository::{AssetRepository, AssetRepositoryImpl};
pub use price_repository::{PriceRepository, PriceRepositoryImpl};
