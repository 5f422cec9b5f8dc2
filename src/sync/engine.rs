use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use utoipa::ToSchema;
use uuid::Uuid;

use super::change::change_percent;
use super::errors::SyncError;
use crate::database::{
    Asset, AssetRepository, DatabaseError, PriceRecord, PriceRepository, SaveOutcome,
};
use crate::quotes::{BatchFetcher, BatchResult, FetchOptions, Quote, QuoteClient, Symbol};

/// Source tag stored on records fetched from the upstream quote API
pub const UPSTREAM_SOURCE: &str = "upstream";

/// Outcome of one full synchronization pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    /// Active assets considered
    pub total_candidates: usize,
    /// Assets with a price record written
    pub updated: usize,
    /// Assets without a usable quote or whose write failed
    #[schema(value_type = Vec<String>, example = json!(["ZZZZ"]))]
    pub failed_symbols: Vec<Symbol>,
}

/// Orchestrates price synchronization against the store
///
/// Holds no state of its own; every read and write goes through the repositories.
pub struct SyncEngine {
    assets: Arc<dyn AssetRepository>,
    prices: Arc<dyn PriceRepository>,
    quote_client: Arc<dyn QuoteClient>,
    fetcher: BatchFetcher,
    options: FetchOptions,
}

impl SyncEngine {
    pub fn new(
        assets: Arc<dyn AssetRepository>,
        prices: Arc<dyn PriceRepository>,
        quote_client: Arc<dyn QuoteClient>,
        options: FetchOptions,
    ) -> Self {
        Self {
            assets,
            prices,
            fetcher: BatchFetcher::new(Arc::clone(&quote_client)),
            quote_client,
            options,
        }
    }

    /// Run one full pass over every active asset
    ///
    /// Only loading the asset list can fail the pass; per-asset problems are
    /// collected into the summary and the loop carries on.
    pub async fn run_once(&self) -> Result<SyncSummary, SyncError> {
        let start = Instant::now();

        let asset_repository = Arc::clone(&self.assets);
        let assets = run_blocking(move || Ok(asset_repository.find_active()?)).await?;
        let symbols: Vec<Symbol> = assets.iter().map(|a| a.symbol.clone()).collect();

        tracing::info!("🔄 Price sync started for {} active assets", assets.len());

        let quotes = self.fetcher.fetch_all(&symbols, &self.options).await;

        let price_repository = Arc::clone(&self.prices);
        let summary =
            run_blocking(move || Ok(persist_batch(price_repository.as_ref(), &assets, &quotes)))
                .await?;

        tracing::info!(
            "✅ Price sync finished in {} ms: {}/{} updated, {} failed",
            start.elapsed().as_millis(),
            summary.updated,
            summary.total_candidates,
            summary.failed_symbols.len()
        );

        Ok(summary)
    }

    /// Fetch and store the current price of a single asset
    ///
    /// Falls back to the last stored price when the upstream has no data, and
    /// writes nothing when the price equals the previous record's, returning
    /// that previous record instead.
    pub async fn fetch_and_save(&self, asset_id: Uuid) -> Result<PriceRecord, SyncError> {
        let asset_repository = Arc::clone(&self.assets);
        let asset = run_blocking(move || Ok(asset_repository.find_by_id(asset_id)?))
            .await?
            .ok_or(SyncError::AssetNotFound(asset_id))?;

        let quote = timeout(
            self.options.per_task_timeout,
            self.quote_client.fetch_price(&asset.symbol),
        )
        .await
        .unwrap_or_else(|_| {
            tracing::warn!("⏱️  Fetching {} timed out", asset.symbol);
            None
        });

        let volume = timeout(
            self.options.per_task_timeout,
            self.quote_client.fetch_volume(&asset.symbol),
        )
        .await
        .ok()
        .flatten();

        let price_repository = Arc::clone(&self.prices);
        run_blocking(move || save_single(price_repository.as_ref(), &asset, quote, volume)).await
    }

    /// Latest stored price for an asset
    pub async fn latest_price(&self, asset_id: Uuid) -> Result<Option<PriceRecord>, SyncError> {
        let price_repository = Arc::clone(&self.prices);
        run_blocking(move || Ok(price_repository.find_latest(asset_id)?)).await
    }
}

/// Persist every quote in the batch, isolating failures per asset
fn persist_batch(
    prices: &dyn PriceRepository,
    assets: &[Asset],
    quotes: &BatchResult,
) -> SyncSummary {
    let mut updated = 0;
    let mut failed_symbols = Vec::new();

    for asset in assets {
        let Some(quote) = quotes.get(&asset.symbol) else {
            failed_symbols.push(asset.symbol.clone());
            continue;
        };

        match persist_quote(prices, asset, quote) {
            Ok(SaveOutcome::Inserted(_)) => updated += 1,
            Ok(SaveOutcome::DuplicateIgnored) => {
                tracing::debug!("Duplicate price for {} ignored", asset.symbol);
                updated += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to save price for {}: {}", asset.symbol, e);
                failed_symbols.push(asset.symbol.clone());
            }
        }
    }

    SyncSummary {
        total_candidates: assets.len(),
        updated,
        failed_symbols,
    }
}

fn persist_quote(
    prices: &dyn PriceRepository,
    asset: &Asset,
    quote: &Quote,
) -> Result<SaveOutcome, DatabaseError> {
    let previous = prices.find_latest(asset.id)?;
    let change = previous
        .as_ref()
        .and_then(|p| change_percent(p.price, quote.price()));

    let record = PriceRecord::new(asset.id, quote.price(), Utc::now(), UPSTREAM_SOURCE)
        .with_change_percent(change);

    prices.insert(record)
}

fn save_single(
    prices: &dyn PriceRepository,
    asset: &Asset,
    quote: Option<Quote>,
    volume: Option<Decimal>,
) -> Result<PriceRecord, SyncError> {
    let previous = prices.find_latest(asset.id)?;

    let (price, source) = match quote {
        Some(quote) => (quote.price(), UPSTREAM_SOURCE.to_string()),
        None => {
            tracing::warn!("Upstream fetch failed for {}, using last known price", asset.symbol);
            let last = previous
                .as_ref()
                .ok_or_else(|| SyncError::NoPriceAvailable(asset.symbol.clone()))?;
            (last.price, last.source.clone())
        }
    };

    if let Some(previous) = previous.as_ref().filter(|p| p.price == price) {
        tracing::debug!("⏸  No price change for {}, skipping insert", asset.symbol);
        return Ok(previous.clone());
    }

    let change = previous.as_ref().and_then(|p| change_percent(p.price, price));
    if let (Some(previous), Some(change)) = (previous.as_ref(), change) {
        tracing::info!("Change for {}: {} -> {} = {}%", asset.symbol, previous.price, price, change);
    }

    let record = PriceRecord::new(asset.id, price, Utc::now(), &source)
        .with_change_percent(change)
        .with_volume(volume);

    match prices.insert(record.clone())? {
        SaveOutcome::Inserted(saved) => Ok(saved),
        SaveOutcome::DuplicateIgnored => Ok(prices.find_latest(asset.id)?.unwrap_or(record)),
    }
}

/// Run synchronous store work on the blocking pool
async fn run_blocking<T, F>(work: F) -> Result<T, SyncError>
where
    F: FnOnce() -> Result<T, SyncError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| SyncError::TaskFailed(e.to_string()))?
}
