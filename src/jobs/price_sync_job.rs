use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::sync::{SyncEngine, SyncError, SyncSummary};

/// Every 5 minutes
pub const DEFAULT_PRICE_SYNC_SCHEDULE: &str = "0 */5 * * * *";

/// Scheduled full price sync
///
/// Runs the same pass as an on-demand job but outside the job tracker;
/// results are only logged.
pub struct PriceSyncJob {
    engine: Arc<SyncEngine>,
    schedule: String,
}

impl PriceSyncJob {
    /// Create a job on the given cron schedule (seconds field included)
    pub fn new(engine: Arc<SyncEngine>, schedule: impl Into<String>) -> Self {
        Self {
            engine,
            schedule: schedule.into(),
        }
    }

    async fn sync_prices(engine: &SyncEngine) -> Result<SyncSummary, SyncError> {
        tracing::info!("🕐 Scheduled price sync triggered");
        engine.run_once().await
    }

    /// Register this job with the scheduler
    pub async fn register(self, scheduler: &JobScheduler) -> Result<(), Box<dyn std::error::Error>> {
        let engine = Arc::clone(&self.engine);

        let job = Job::new_async(self.schedule.as_str(), move |_uuid, _lock| {
            let engine = Arc::clone(&engine);

            Box::pin(async move {
                match Self::sync_prices(&engine).await {
                    Ok(summary) if summary.failed_symbols.is_empty() => {
                        tracing::debug!("Scheduled price sync completed successfully");
                    }
                    Ok(summary) => {
                        tracing::warn!(
                            "⚠️  Scheduled price sync missed {} symbols: {:?}",
                            summary.failed_symbols.len(),
                            summary.failed_symbols
                        );
                    }
                    Err(e) => tracing::error!("Scheduled price sync failed: {}", e),
                }
            })
        })?;

        scheduler.add(job).await?;

        tracing::info!("✅ Price sync job registered (schedule: {})", self.schedule);

        Ok(())
    }

    /// Run a sync immediately (manual trigger)
    pub async fn run_now(&self) -> Result<SyncSummary, SyncError> {
        Self::sync_prices(&self.engine).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryStore;
    use crate::quotes::{FetchOptions, Quote, QuoteClient};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use std::collections::HashMap;

    struct FixedClient;

    #[async_trait]
    impl QuoteClient for FixedClient {
        async fn fetch_price(&self, symbol: &str) -> Option<Quote> {
            (symbol != "ZZZZ").then(|| Quote::now(dec!(42))).flatten()
        }

        async fn fetch_volume(&self, _symbol: &str) -> Option<Decimal> {
            None
        }

        async fn fetch_metrics(&self, _symbol: &str) -> HashMap<String, Value> {
            HashMap::new()
        }
    }

    fn job(store: &InMemoryStore, schedule: &str) -> PriceSyncJob {
        let engine = SyncEngine::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(FixedClient),
            FetchOptions::default(),
        );
        PriceSyncJob::new(Arc::new(engine), schedule)
    }

    #[tokio::test]
    async fn test_run_now() {
        let store = InMemoryStore::with_symbols(&["AAPL", "ZZZZ"]);

        let summary = job(&store, DEFAULT_PRICE_SYNC_SCHEDULE).run_now().await.unwrap();

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.failed_symbols, vec!["ZZZZ".to_string()]);
        assert_eq!(store.price_count(), 1);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_schedule() {
        let store = InMemoryStore::new();
        let scheduler = JobScheduler::new().await.unwrap();

        assert!(job(&store, "not a cron").register(&scheduler).await.is_err());
        assert!(job(&store, DEFAULT_PRICE_SYNC_SCHEDULE)
            .register(&scheduler)
            .await
            .is_ok());
    }
}
