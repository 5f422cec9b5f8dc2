use market_sync_api::config::AppConfig;
use market_sync_api::database::repositories::{AssetRepositoryImpl, PriceRepositoryImpl};
use market_sync_api::database::{
    establish_connection_pool, run_migrations, AssetRepository, InMemoryStore, PriceRepository,
};
use market_sync_api::jobs::{create_revocation_cleanup_job, PriceSyncJob};
use market_sync_api::{create_router, FinnhubClient, JobTracker, PriceState, SyncEngine, TokenAuthority};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Repositories = (Arc<dyn AssetRepository>, Arc<dyn PriceRepository>);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "market_sync_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let (assets, prices) = initialize_store(&config).await;

    if config.upstream.api_key.is_empty() {
        tracing::warn!("⚠️  FINNHUB_API_KEY not set, upstream requests will be rejected");
    }
    let quote_client = Arc::new(FinnhubClient::new(
        config.upstream.base_url.clone(),
        config.upstream.api_key.clone(),
        Duration::from_secs(config.upstream.http_timeout_secs),
    )?);

    let engine = Arc::new(SyncEngine::new(
        assets,
        prices,
        quote_client,
        config.fetch.to_options(),
    ));
    let jobs = JobTracker::new(Arc::clone(&engine), config.jobs.to_retention());

    let tokens = TokenAuthority::new(
        &config.auth.jwt_secret,
        Duration::from_millis(config.auth.jwt_expiration_ms),
    )?;

    initialize_cron_scheduler(&config, Arc::clone(&engine), tokens.clone()).await;

    let app = create_router(PriceState { engine, jobs }, tokens);

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;

    tracing::info!("🚀 Market Sync API running on http://{}", config.server_addr);
    tracing::info!("📊 Health check: http://{}/api/v1/health", config.server_addr);
    tracing::info!("📚 Swagger UI: http://{}/swagger-ui", config.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Connect to PostgreSQL when DATABASE_URL is set, otherwise use a seeded in-memory store
async fn initialize_store(config: &AppConfig) -> Repositories {
    let Some(database_url) = config.database_url.clone() else {
        return in_memory_store(config);
    };

    tracing::info!("🗄️  Initializing PostgreSQL connection...");

    let pool_size = config.db_pool_max_size;
    let setup = tokio::task::spawn_blocking(move || {
        let pool = establish_connection_pool(&database_url, pool_size)?;
        let applied = run_migrations(&pool)?;
        Ok::<_, market_sync_api::database::DatabaseError>((pool, applied))
    })
    .await;

    match setup {
        Ok(Ok((pool, applied))) => {
            tracing::info!("✅ Database ready ({} migrations applied)", applied);
            (
                Arc::new(AssetRepositoryImpl::new(pool.clone())) as Arc<dyn AssetRepository>,
                Arc::new(PriceRepositoryImpl::new(pool)) as Arc<dyn PriceRepository>,
            )
        }
        Ok(Err(e)) => {
            tracing::error!("❌ Failed to initialize database: {}", e);
            tracing::warn!("⚠️  Falling back to the in-memory store");
            in_memory_store(config)
        }
        Err(e) => {
            tracing::error!("❌ Database setup task failed: {}", e);
            in_memory_store(config)
        }
    }
}

fn in_memory_store(config: &AppConfig) -> Repositories {
    let store = InMemoryStore::with_symbols(&config.seed_symbols);

    tracing::info!("💾 Using in-memory store");
    tracing::info!("   Seeded assets: {}", config.seed_symbols.join(", "));

    (
        Arc::new(store.clone()) as Arc<dyn AssetRepository>,
        Arc::new(store) as Arc<dyn PriceRepository>,
    )
}

/// Initialize cron scheduler for periodic jobs
async fn initialize_cron_scheduler(
    config: &AppConfig,
    engine: Arc<SyncEngine>,
    tokens: TokenAuthority,
) {
    use tokio_cron_scheduler::JobScheduler;

    tracing::info!("⏰ Initializing cron scheduler...");

    let scheduler = match JobScheduler::new().await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            tracing::error!("❌ Failed to create cron scheduler: {}", e);
            return;
        }
    };

    if let Err(e) = create_revocation_cleanup_job(tokens, &scheduler).await {
        tracing::error!("❌ Failed to register revocation cleanup job: {}", e);
        return;
    }

    if let Some(schedule) = &config.price_sync_cron {
        if let Err(e) = PriceSyncJob::new(engine, schedule.clone()).register(&scheduler).await {
            tracing::error!("❌ Failed to register price sync job: {}", e);
            return;
        }
    } else {
        tracing::info!("   Scheduled price sync disabled (PRICE_SYNC_CRON not set)");
    }

    if let Err(e) = scheduler.start().await {
        tracing::error!("❌ Failed to start cron scheduler: {}", e);
        return;
    }

    tracing::info!("✅ Cron scheduler started successfully");

    // Keep scheduler alive for the lifetime of the process
    std::mem::forget(scheduler);
}
