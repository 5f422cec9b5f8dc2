use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::database::PriceRecord;
use crate::jobs::{JobRecord, JobTracker};
use crate::sync::{SyncEngine, SyncError};

use super::responses::{ApiError, ErrorResponse, JobNotFoundResponse, JobStartedResponse};

/// Shared state for price endpoints
#[derive(Clone)]
pub struct PriceState {
    pub engine: Arc<SyncEngine>,
    pub jobs: JobTracker,
}

fn sync_error_response(e: SyncError) -> ApiError {
    if e.is_not_found() {
        ErrorResponse::reply(StatusCode::NOT_FOUND, "not_found", e.to_string())
    } else {
        tracing::error!("Price request failed: {}", e);
        ErrorResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", e.to_string())
    }
}

/// Start a full price sync in the background
#[utoipa::path(
    post,
    path = "/api/v1/prices/fetch-all/start",
    tag = "Prices",
    responses(
        (status = 202, description = "Job started", body = JobStartedResponse)
    )
)]
pub async fn start_fetch_all(
    State(state): State<PriceState>,
) -> (StatusCode, Json<JobStartedResponse>) {
    let job_id = state.jobs.start();

    (
        StatusCode::ACCEPTED,
        Json(JobStartedResponse {
            job_id,
            message: "Price sync started".to_string(),
        }),
    )
}

/// Poll the state of a background sync job
#[utoipa::path(
    get,
    path = "/api/v1/prices/fetch-all/status/{job_id}",
    tag = "Prices",
    params(
        ("job_id" = Uuid, Path, description = "Job ID returned by the start endpoint")
    ),
    responses(
        (status = 200, description = "Job record", body = JobRecord),
        (status = 404, description = "Unknown or evicted job", body = JobNotFoundResponse)
    )
)]
pub async fn get_fetch_all_status(
    State(state): State<PriceState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRecord>, (StatusCode, Json<JobNotFoundResponse>)> {
    state
        .jobs
        .status(job_id)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, Json(JobNotFoundResponse::new())))
}

/// Fetch and store the current price of one asset
#[utoipa::path(
    post,
    path = "/api/v1/prices/{asset_id}/fetch",
    tag = "Prices",
    params(
        ("asset_id" = Uuid, Path, description = "Asset ID")
    ),
    responses(
        (status = 201, description = "Stored (or unchanged) price record", body = PriceRecord),
        (status = 404, description = "Asset not found or no price available", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn fetch_price(
    State(state): State<PriceState>,
    Path(asset_id): Path<Uuid>,
) -> Result<(StatusCode, Json<PriceRecord>), ApiError> {
    let record = state
        .engine
        .fetch_and_save(asset_id)
        .await
        .map_err(sync_error_response)?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Latest stored price of one asset
#[utoipa::path(
    get,
    path = "/api/v1/prices/{asset_id}/latest",
    tag = "Prices",
    params(
        ("asset_id" = Uuid, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "Latest price record", body = PriceRecord),
        (status = 404, description = "No price stored for the asset", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_latest_price(
    State(state): State<PriceState>,
    Path(asset_id): Path<Uuid>,
) -> Result<Json<PriceRecord>, ApiError> {
    state
        .engine
        .latest_price(asset_id)
        .await
        .map_err(sync_error_response)?
        .map(Json)
        .ok_or_else(|| {
            ErrorResponse::reply(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("No price for asset {}", asset_id),
            )
        })
}
