/// Upstream quote access
///
/// - `Quote`: a validated price observation
/// - `QuoteClient`: fail-soft, one-symbol-at-a-time access to the upstream API
/// - `FinnhubClient`: HTTP implementation of `QuoteClient`
/// - `BatchFetcher`: bounded worker pool fanning a symbol list out over a `QuoteClient`

pub mod batch_fetcher;
pub mod client;
pub mod finnhub;
pub mod models;

pub use batch_fetcher::{BatchFetcher, BatchResult, FetchOptions};
pub use client::QuoteClient;
pub use finnhub::{FinnhubClient, QuoteError};
pub use models::{Quote, Symbol};
