use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;

use super::models::Quote;

/// Quote client trait - one upstream request per call
///
/// Every method is fail-soft: transport errors, non-success responses and
/// missing or invalid fields come back as `None` (or an empty map), never as an
/// error. Implementations do not retry; callers own concurrency and retry policy.
#[async_trait]
pub trait QuoteClient: Send + Sync {
    /// Current price for a symbol
    async fn fetch_price(&self, symbol: &str) -> Option<Quote>;

    /// Current trading volume for a symbol
    async fn fetch_volume(&self, symbol: &str) -> Option<Decimal>;

    /// Financial metrics (P/E, P/B, ROE, ...) for a symbol
    async fn fetch_metrics(&self, symbol: &str) -> HashMap<String, Value>;
}
