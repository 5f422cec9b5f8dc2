use crate::database::connection::{get_connection, DatabaseError, PgPool};
use crate::database::models::Asset;
use crate::database::schema::assets;
use diesel::prelude::*;
use uuid::Uuid;

/// Asset repository trait - read access to the asset catalog
pub trait AssetRepository: Send + Sync {
    /// All assets flagged active, ordered by symbol
    fn find_active(&self) -> Result<Vec<Asset>, DatabaseError>;

    /// Find asset by ID
    fn find_by_id(&self, asset_id: Uuid) -> Result<Option<Asset>, DatabaseError>;
}

/// PostgreSQL implementation of AssetRepository
pub struct AssetRepositoryImpl {
    pool: PgPool,
}

impl AssetRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AssetRepository for AssetRepositoryImpl {
    fn find_active(&self) -> Result<Vec<Asset>, DatabaseError> {
        let mut conn = get_connection(&self.pool)?;

        assets::table
            .filter(assets::is_active.eq(true))
            .order(assets::symbol.asc())
            .load::<Asset>(&mut conn)
            .map_err(DatabaseError::from)
    }

    fn find_by_id(&self, asset_id: Uuid) -> Result<Option<Asset>, DatabaseError> {
        let mut conn = get_connection(&self.pool)?;

        assets::table
            .filter(assets::id.eq(asset_id))
            .first::<Asset>(&mut conn)
            .optional()
            .map_err(DatabaseError::from)
    }
}
