use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::TokenAuthority;

use super::auth_handlers::*;
use super::handlers::health_check;
use super::openapi::ApiDoc;
use super::price_handlers::*;

/// Create the API router with Swagger UI
pub fn create_router(prices: PriceState, tokens: TokenAuthority) -> Router {
    let price_router = Router::new()
        .route("/api/v1/prices/fetch-all/start", post(start_fetch_all))
        .route("/api/v1/prices/fetch-all/status/:job_id", get(get_fetch_all_status))
        .route("/api/v1/prices/:asset_id/fetch", post(fetch_price))
        .route("/api/v1/prices/:asset_id/latest", get(get_latest_price))
        .with_state(prices);

    let auth_router = Router::new()
        .route("/api/v1/auth/verify", get(verify_token))
        .route("/api/v1/auth/logout", post(logout))
        .with_state(tokens);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/v1/health", get(health_check))
        .merge(price_router)
        .merge(auth_router)
}
