use std::str::FromStr;
use std::time::Duration;

use crate::jobs::JobRetention;
use crate::quotes::FetchOptions;

/// Development-only signing secret, used when JWT_SECRET is not set
const DEFAULT_JWT_SECRET: &str = "defaultSecretChangeMePleaseChangeInProd1234567890";

/// Application configuration, loaded from the environment (and `.env` when present)
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub server_addr: String,

    /// PostgreSQL URL; without it the service runs on the in-memory store
    pub database_url: Option<String>,

    /// Maximum connections in the r2d2 pool
    pub db_pool_max_size: u32,

    /// Upstream quote API settings
    pub upstream: UpstreamConfig,

    /// Batch fetch tuning
    pub fetch: FetchConfig,

    /// Token issuance settings
    pub auth: AuthConfig,

    /// Job record retention
    pub jobs: JobRetentionConfig,

    /// Optional cron expression for a scheduled full sync (e.g. "0 */5 * * * *")
    pub price_sync_cron: Option<String>,

    /// Symbols seeded into the in-memory store
    pub seed_symbols: Vec<String>,
}

/// Upstream quote API configuration
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the quote API
    pub base_url: String,

    /// Pre-shared API token
    pub api_key: String,

    /// HTTP timeout applied to each upstream request
    pub http_timeout_secs: u64,
}

/// Batch fetch configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub max_workers: usize,

    pub task_timeout_secs: u64,

    pub delay_ms: u64,
}

/// Token authority configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC signing secret (at least 32 bytes)
    pub jwt_secret: String,

    /// Token lifetime in milliseconds
    pub jwt_expiration_ms: u64,
}

/// Job record retention configuration
#[derive(Debug, Clone)]
pub struct JobRetentionConfig {
    /// How long a finished job stays pollable
    pub retention_secs: u64,

    /// Maximum number of finished jobs retained
    pub max_records: usize,
}

impl AppConfig {
    /// Build configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_addr: env_or("SERVER_ADDR", defaults.server_addr),
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            db_pool_max_size: env_parse("DB_POOL_MAX_SIZE", defaults.db_pool_max_size),
            upstream: UpstreamConfig {
                base_url: env_or("FINNHUB_BASE_URL", defaults.upstream.base_url),
                api_key: env_or("FINNHUB_API_KEY", defaults.upstream.api_key),
                http_timeout_secs: env_parse(
                    "QUOTE_HTTP_TIMEOUT_SECS",
                    defaults.upstream.http_timeout_secs,
                ),
            },
            fetch: FetchConfig {
                max_workers: env_parse("FETCH_MAX_WORKERS", defaults.fetch.max_workers),
                task_timeout_secs: env_parse(
                    "FETCH_TASK_TIMEOUT_SECS",
                    defaults.fetch.task_timeout_secs,
                ),
                delay_ms: env_parse("FETCH_DELAY_MS", defaults.fetch.delay_ms),
            },
            auth: AuthConfig {
                jwt_secret: env_or("JWT_SECRET", defaults.auth.jwt_secret),
                jwt_expiration_ms: env_parse("JWT_EXPIRATION_MS", defaults.auth.jwt_expiration_ms),
            },
            jobs: JobRetentionConfig {
                retention_secs: env_parse("JOB_RETENTION_SECS", defaults.jobs.retention_secs),
                max_records: env_parse("JOB_MAX_RECORDS", defaults.jobs.max_records),
            },
            price_sync_cron: std::env::var("PRICE_SYNC_CRON").ok().filter(|v| !v.is_empty()),
            seed_symbols: std::env::var("SEED_SYMBOLS")
                .map(|v| parse_symbol_list(&v))
                .unwrap_or(defaults.seed_symbols),
        }
    }
}

impl FetchConfig {
    pub fn to_options(&self) -> FetchOptions {
        FetchOptions {
            max_workers: self.max_workers,
            per_task_timeout: Duration::from_secs(self.task_timeout_secs),
            inter_request_delay: Duration::from_millis(self.delay_ms),
        }
    }
}

impl JobRetentionConfig {
    pub fn to_retention(&self) -> JobRetention {
        JobRetention {
            ttl: Duration::from_secs(self.retention_secs),
            max_records: self.max_records,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_addr: default_server_addr(),
            database_url: None,
            db_pool_max_size: default_pool_size(),
            upstream: UpstreamConfig::default(),
            fetch: FetchConfig::default(),
            auth: AuthConfig::default(),
            jobs: JobRetentionConfig::default(),
            price_sync_cron: None,
            seed_symbols: default_seed_symbols(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            task_timeout_secs: default_task_timeout(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_expiration_ms: default_jwt_expiration_ms(),
        }
    }
}

impl Default for JobRetentionConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_job_retention(),
            max_records: default_job_max_records(),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T: FromStr + std::fmt::Debug>(key: &str, default: T) -> T {
    let Ok(raw) = std::env::var(key) else {
        return default;
    };

    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!("⚠️  Ignoring invalid {}={:?}, using default {:?}", key, raw, default);
        default
    })
}

/// Split a comma-separated symbol list, trimming and upper-casing each entry
pub fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

// Default values
fn default_server_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_base_url() -> String {
    "https://finnhub.io/api/v1".to_string()
}

fn default_http_timeout() -> u64 {
    10
}

fn default_max_workers() -> usize {
    5
}

fn default_task_timeout() -> u64 {
    15
}

fn default_delay_ms() -> u64 {
    100
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_jwt_expiration_ms() -> u64 {
    86_400_000 // 1 day
}

fn default_job_retention() -> u64 {
    3600
}

fn default_job_max_records() -> usize {
    1000
}

fn default_seed_symbols() -> Vec<String> {
    vec!["AAPL".to_string(), "MSFT".to_string(), "GOOGL".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_recommended_fetch_options() {
        let options = AppConfig::default().fetch.to_options();

        assert_eq!(options.max_workers, 5);
        assert_eq!(options.per_task_timeout, Duration::from_secs(15));
        assert_eq!(options.inter_request_delay, Duration::from_millis(100));
    }

    #[test]
    fn test_env_parse_falls_back_on_invalid_value() {
        std::env::set_var("MARKET_SYNC_TEST_WORKERS", "lots");
        assert_eq!(env_parse("MARKET_SYNC_TEST_WORKERS", 5usize), 5);

        std::env::set_var("MARKET_SYNC_TEST_WORKERS", " 3 ");
        assert_eq!(env_parse("MARKET_SYNC_TEST_WORKERS", 5usize), 3);

        std::env::remove_var("MARKET_SYNC_TEST_WORKERS");
        assert_eq!(env_parse("MARKET_SYNC_TEST_WORKERS", 5usize), 5);
    }

    #[test]
    fn test_parse_symbol_list() {
        assert_eq!(
            parse_symbol_list(" aapl, MSFT,,zzzz "),
            vec!["AAPL".to_string(), "MSFT".to_string(), "ZZZZ".to_string()]
        );
        assert!(parse_symbol_list("").is_empty());
    }

    #[test]
    fn test_job_retention_defaults() {
        let retention = AppConfig::default().jobs.to_retention();
        assert_eq!(retention, JobRetention::default());
    }

    #[test]
    fn test_default_secret_is_long_enough() {
        assert!(AppConfig::default().auth.jwt_secret.len() >= 32);
    }
}
