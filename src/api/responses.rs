use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Response after starting a background sync job
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobStartedResponse {
    pub job_id: Uuid,
    pub message: String,
}

/// Body returned when a job id is unknown or has been evicted
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobNotFoundResponse {
    /// Always "NOT_FOUND"
    #[schema(example = "NOT_FOUND")]
    pub status: String,
}

impl JobNotFoundResponse {
    pub fn new() -> Self {
        Self {
            status: "NOT_FOUND".to_string(),
        }
    }
}

impl Default for JobNotFoundResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response after revoking a token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error kind (e.g., "not_found")
    pub error: String,
    pub message: String,
}

/// Error half of every fallible handler
pub type ApiError = (StatusCode, Json<ErrorResponse>);

impl ErrorResponse {
    pub fn reply(status: StatusCode, error: &str, message: impl Into<String>) -> ApiError {
        (
            status,
            Json(Self {
                error: error.to_string(),
                message: message.into(),
            }),
        )
    }
}
