use crate::database::connection::{get_connection, DatabaseError, PgPool};
use crate::database::models::{PriceRecord, SaveOutcome};
use crate::database::schema::prices;
use diesel::prelude::*;
use uuid::Uuid;

/// Price repository trait - latest-price lookups and inserts
pub trait PriceRepository: Send + Sync {
    /// Most recent record for an asset (by observation time)
    fn find_latest(&self, asset_id: Uuid) -> Result<Option<PriceRecord>, DatabaseError>;

    /// Insert a record; a duplicate (asset, observed_at, source) is ignored, not an error
    fn insert(&self, record: PriceRecord) -> Result<SaveOutcome, DatabaseError>;
}

/// PostgreSQL implementation of PriceRepository
pub struct PriceRepositoryImpl {
    pool: PgPool,
}

impl PriceRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PriceRepository for PriceRepositoryImpl {
    fn find_latest(&self, asset_id: Uuid) -> Result<Option<PriceRecord>, DatabaseError> {
        let mut conn = get_connection(&self.pool)?;

        prices::table
            .filter(prices::asset_id.eq(asset_id))
            .order(prices::observed_at.desc())
            .first::<PriceRecord>(&mut conn)
            .optional()
            .map_err(DatabaseError::from)
    }

    fn insert(&self, record: PriceRecord) -> Result<SaveOutcome, DatabaseError> {
        let mut conn = get_connection(&self.pool)?;

        // ON CONFLICT DO NOTHING returns no row for a duplicate
        let inserted = diesel::insert_into(prices::table)
            .values(&record)
            .on_conflict_do_nothing()
            .get_result::<PriceRecord>(&mut conn)
            .optional()?;

        Ok(match inserted {
            Some(saved) => SaveOutcome::Inserted(saved),
            None => {
                tracing::debug!(
                    "Duplicate price for asset {} at {} ({}) ignored",
                    record.asset_id,
                    record.observed_at,
                    record.source
                );
                SaveOutcome::DuplicateIgnored
            }
        })
    }
}
