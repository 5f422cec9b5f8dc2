use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use super::client::QuoteClient;
use super::models::Quote;

const QUOTE_ENDPOINT: &str = "/quote";
const METRIC_ENDPOINT: &str = "/stock/metric";

/// Reasons an upstream call produced no data
///
/// Never crosses the `QuoteClient` boundary; used for logging only.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(StatusCode),

    #[error("Missing field '{0}' in upstream response")]
    MissingField(&'static str),

    #[error("Invalid value for '{field}': {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("Non-positive price: {0}")]
    NonPositivePrice(Decimal),
}

/// HTTP client for the Finnhub quote API
///
/// Authenticated with a pre-shared token passed as a query parameter.
pub struct FinnhubClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl FinnhubClient {
    /// Create a client against `base_url` with a per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, QuoteError> {
        let http = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Issue one GET request and decode the JSON body; only 200 is accepted
    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, QuoteError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(QuoteError::Status(status));
        }

        Ok(response.json::<Value>().await?)
    }

    async fn request_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let body = self.get_json(QUOTE_ENDPOINT, &[("symbol", symbol)]).await?;

        let price = decimal_field(&body, "c")?;
        let observed_at = body
            .get("t")
            .and_then(Value::as_i64)
            .filter(|t| *t > 0)
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .unwrap_or_else(Utc::now);

        Quote::new(price, observed_at).ok_or(QuoteError::NonPositivePrice(price))
    }

    async fn request_volume(&self, symbol: &str) -> Result<Decimal, QuoteError> {
        let body = self.get_json(QUOTE_ENDPOINT, &[("symbol", symbol)]).await?;
        decimal_field(&body, "v")
    }

    async fn request_metrics(&self, symbol: &str) -> Result<HashMap<String, Value>, QuoteError> {
        let body = self
            .get_json(METRIC_ENDPOINT, &[("symbol", symbol), ("metric", "all")])
            .await?;

        match body.get("metric") {
            Some(Value::Object(map)) => Ok(map.clone().into_iter().collect()),
            _ => Err(QuoteError::MissingField("metric")),
        }
    }
}

#[async_trait]
impl QuoteClient for FinnhubClient {
    async fn fetch_price(&self, symbol: &str) -> Option<Quote> {
        match self.request_quote(symbol).await {
            Ok(quote) => Some(quote),
            Err(e) => {
                tracing::warn!("No price for {}: {}", symbol, e);
                None
            }
        }
    }

    async fn fetch_volume(&self, symbol: &str) -> Option<Decimal> {
        match self.request_volume(symbol).await {
            Ok(volume) => Some(volume),
            Err(e) => {
                tracing::warn!("No volume for {}: {}", symbol, e);
                None
            }
        }
    }

    async fn fetch_metrics(&self, symbol: &str) -> HashMap<String, Value> {
        self.request_metrics(symbol).await.unwrap_or_else(|e| {
            tracing::warn!("Failed to fetch metrics for {}: {}", symbol, e);
            HashMap::new()
        })
    }
}

/// Read a numeric field, accepting JSON numbers and numeric strings
fn decimal_field(body: &Value, field: &'static str) -> Result<Decimal, QuoteError> {
    let raw = match body.get(field) {
        None | Some(Value::Null) => return Err(QuoteError::MissingField(field)),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| QuoteError::InvalidField { field, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> FinnhubClient {
        FinnhubClient::new(server.uri(), "test-key", Duration::from_secs(2)).unwrap()
    }

    async fn mount_quote(server: &MockServer, symbol: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/quote"))
            .and(query_param("symbol", symbol))
            .and(query_param("token", "test-key"))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[test]
    fn test_decimal_field_parsing() {
        let body = json!({"c": 189.98, "s": "12.5", "e": 1e3, "bad": "abc", "n": null});

        assert_eq!(decimal_field(&body, "c").unwrap(), dec!(189.98));
        assert_eq!(decimal_field(&body, "s").unwrap(), dec!(12.5));
        assert_eq!(decimal_field(&body, "e").unwrap(), dec!(1000));
        assert!(matches!(decimal_field(&body, "bad"), Err(QuoteError::InvalidField { .. })));
        assert!(matches!(decimal_field(&body, "n"), Err(QuoteError::MissingField("n"))));
        assert!(matches!(decimal_field(&body, "x"), Err(QuoteError::MissingField("x"))));
    }

    #[tokio::test]
    async fn test_fetch_price_success() {
        let server = MockServer::start().await;
        mount_quote(
            &server,
            "AAPL",
            ResponseTemplate::new(200).set_body_json(json!({"c": 189.98, "t": 1_700_000_000})),
        )
        .await;

        let quote = client_for(&server).await.fetch_price("AAPL").await.unwrap();
        assert_eq!(quote.price(), dec!(189.98));
        assert_eq!(quote.observed_at().timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_fetch_price_absent_on_bad_data() {
        let server = MockServer::start().await;
        mount_quote(&server, "ZERO", ResponseTemplate::new(200).set_body_json(json!({"c": 0})))
            .await;
        mount_quote(&server, "NEG", ResponseTemplate::new(200).set_body_json(json!({"c": -3.2})))
            .await;
        mount_quote(&server, "NONE", ResponseTemplate::new(200).set_body_json(json!({"d": 1})))
            .await;
        mount_quote(&server, "DOWN", ResponseTemplate::new(503)).await;
        mount_quote(&server, "TEXT", ResponseTemplate::new(200).set_body_string("oops")).await;

        let client = client_for(&server).await;
        for symbol in ["ZERO", "NEG", "NONE", "DOWN", "TEXT"] {
            assert!(client.fetch_price(symbol).await.is_none(), "{} should be absent", symbol);
        }
    }

    #[tokio::test]
    async fn test_fetch_price_absent_on_transport_error() {
        let client =
            FinnhubClient::new("http://127.0.0.1:9", "test-key", Duration::from_millis(200)).unwrap();
        assert!(client.fetch_price("AAPL").await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_volume() {
        let server = MockServer::start().await;
        mount_quote(
            &server,
            "AAPL",
            ResponseTemplate::new(200).set_body_json(json!({"c": 189.98, "v": 52_000_000})),
        )
        .await;
        mount_quote(&server, "MSFT", ResponseTemplate::new(200).set_body_json(json!({"c": 410.2})))
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.fetch_volume("AAPL").await, Some(dec!(52000000)));
        assert_eq!(client.fetch_volume("MSFT").await, None);
    }

    #[tokio::test]
    async fn test_fetch_metrics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stock/metric"))
            .and(query_param("symbol", "AAPL"))
            .and(query_param("metric", "all"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"metric": {"peBasicExclExtraTTM": 29.4, "beta": 1.2}})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let metrics = client.fetch_metrics("AAPL").await;
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics.get("beta"), Some(&json!(1.2)));

        assert!(client.fetch_metrics("MSFT").await.is_empty());
    }
}
