use utoipa::OpenApi;

use crate::api::{auth_handlers, handlers, price_handlers};
use crate::api::responses::*;
use crate::auth::TokenVerification;
use crate::database::PriceRecord;
use crate::jobs::{JobRecord, JobState};
use crate::sync::SyncSummary;

/// OpenAPI document
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Market Sync API",
        version = "1.0.0",
        description = "Market price synchronization with background jobs and token verification"
    ),
    paths(
        handlers::health_check,
        price_handlers::start_fetch_all,
        price_handlers::get_fetch_all_status,
        price_handlers::fetch_price,
        price_handlers::get_latest_price,
        auth_handlers::verify_token,
        auth_handlers::logout,
    ),
    components(
        schemas(
            PriceRecord,
            SyncSummary,
            JobRecord,
            JobState,
            JobStartedResponse,
            JobNotFoundResponse,
            TokenVerification,
            LogoutResponse,
            HealthResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Prices", description = "Price synchronization and lookup"),
        (name = "Auth", description = "Token verification and revocation"),
    )
)]
pub struct ApiDoc;
