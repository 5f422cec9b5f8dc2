use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Price record - one stored price observation for an asset
///
/// `(asset_id, observed_at, source)` is unique; the store ignores a duplicate insert.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = crate::database::schema::prices)]
pub struct PriceRecord {
    pub id: Uuid,

    pub asset_id: Uuid,

    #[schema(value_type = String, example = "189.98")]
    pub price: Decimal,

    pub observed_at: DateTime<Utc>,

    /// Where the price came from (e.g., "upstream")
    pub source: String,

    /// Percent change against the previous record, 4 decimal places;
    /// null when there is no previous record or it was zero
    #[schema(value_type = Option<String>, example = "10.0000")]
    pub change_percent: Option<Decimal>,

    /// Trading volume at observation time, when known
    #[schema(value_type = Option<String>, example = "52000000")]
    pub volume: Option<Decimal>,
}

impl PriceRecord {
    /// Create a new record with a fresh id
    pub fn new(asset_id: Uuid, price: Decimal, observed_at: DateTime<Utc>, source: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset_id,
            price,
            observed_at,
            source: source.to_string(),
            change_percent: None,
            volume: None,
        }
    }

    pub fn with_change_percent(mut self, change_percent: Option<Decimal>) -> Self {
        self.change_percent = change_percent;
        self
    }

    pub fn with_volume(mut self, volume: Option<Decimal>) -> Self {
        self.volume = volume;
        self
    }
}

/// Result of persisting a price record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted(PriceRecord),
    /// A record with the same (asset, observed_at, source) already existed
    DuplicateIgnored,
}
