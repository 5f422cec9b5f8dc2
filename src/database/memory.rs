use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

use super::connection::DatabaseError;
use super::models::{Asset, NewAsset, PriceRecord, SaveOutcome};
use super::repositories::{AssetRepository, PriceRepository};

/// In-memory asset and price store
///
/// Used when no database is configured. Enforces the same
/// `(asset_id, observed_at, source)` uniqueness as the SQL schema.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    assets: Arc<RwLock<Vec<Asset>>>,
    prices: Arc<RwLock<Vec<PriceRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with one active asset per symbol
    pub fn with_symbols<S: AsRef<str>>(symbols: &[S]) -> Self {
        let store = Self::new();
        for symbol in symbols {
            store.insert_asset(NewAsset::new(symbol.as_ref(), symbol.as_ref()));
        }
        store
    }

    /// Insert an asset; an existing asset with the same symbol is returned unchanged
    pub fn insert_asset(&self, new_asset: NewAsset) -> Asset {
        let mut assets = self.assets.write();

        if let Some(existing) = assets.iter().find(|a| a.symbol == new_asset.symbol) {
            return existing.clone();
        }

        let asset = new_asset.into_asset(Utc::now());
        assets.push(asset.clone());
        asset
    }

    /// Find an asset by symbol
    pub fn find_by_symbol(&self, symbol: &str) -> Option<Asset> {
        self.assets.read().iter().find(|a| a.symbol == symbol).cloned()
    }

    /// All stored price records for an asset, oldest first
    pub fn price_history(&self, asset_id: Uuid) -> Vec<PriceRecord> {
        let mut history: Vec<PriceRecord> = self
            .prices
            .read()
            .iter()
            .filter(|p| p.asset_id == asset_id)
            .cloned()
            .collect();
        history.sort_by_key(|p| p.observed_at);
        history
    }

    /// Total number of stored price records
    pub fn price_count(&self) -> usize {
        self.prices.read().len()
    }
}

impl AssetRepository for InMemoryStore {
    fn find_active(&self) -> Result<Vec<Asset>, DatabaseError> {
        let mut active: Vec<Asset> = self
            .assets
            .read()
            .iter()
            .filter(|a| a.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(active)
    }

    fn find_by_id(&self, asset_id: Uuid) -> Result<Option<Asset>, DatabaseError> {
        Ok(self.assets.read().iter().find(|a| a.id == asset_id).cloned())
    }
}

impl PriceRepository for InMemoryStore {
    fn find_latest(&self, asset_id: Uuid) -> Result<Option<PriceRecord>, DatabaseError> {
        // max_by_key keeps the last of equal timestamps, i.e. the latest insert
        Ok(self
            .prices
            .read()
            .iter()
            .filter(|p| p.asset_id == asset_id)
            .max_by_key(|p| p.observed_at)
            .cloned())
    }

    fn insert(&self, record: PriceRecord) -> Result<SaveOutcome, DatabaseError> {
        let mut prices = self.prices.write();

        let duplicate = prices.iter().any(|p| {
            p.asset_id == record.asset_id
                && p.observed_at == record.observed_at
                && p.source == record.source
        });
        if duplicate {
            return Ok(SaveOutcome::DuplicateIgnored);
        }

        prices.push(record.clone());
        Ok(SaveOutcome::Inserted(record))
    }
}
