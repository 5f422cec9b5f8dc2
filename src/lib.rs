// Library crate root
pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod jobs;
pub mod quotes;
pub mod sync;

pub use api::{create_router, PriceState};
pub use auth::{AuthError, TokenAuthority, TokenVerification};
pub use config::AppConfig;
pub use jobs::{JobRecord, JobRetention, JobState, JobTracker};
pub use quotes::{BatchFetcher, BatchResult, FetchOptions, FinnhubClient, Quote, QuoteClient};
pub use sync::{SyncEngine, SyncError, SyncSummary};
