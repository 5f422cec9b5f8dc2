use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};

use crate::auth::{TokenAuthority, TokenVerification};

use super::responses::{ApiError, ErrorResponse, LogoutResponse};

/// Token carried in an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn missing_token() -> ApiError {
    ErrorResponse::reply(StatusCode::UNAUTHORIZED, "unauthorized", "Missing bearer token")
}

/// Verify the bearer token
#[utoipa::path(
    get,
    path = "/api/v1/auth/verify",
    tag = "Auth",
    responses(
        (status = 200, description = "Verification result", body = TokenVerification),
        (status = 401, description = "No bearer token supplied", body = ErrorResponse)
    )
)]
pub async fn verify_token(
    State(authority): State<TokenAuthority>,
    headers: HeaderMap,
) -> Result<Json<TokenVerification>, ApiError> {
    let token = bearer_token(&headers).ok_or_else(missing_token)?;
    Ok(Json(authority.verify(token)))
}

/// Revoke the bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Token revoked", body = LogoutResponse),
        (status = 401, description = "No bearer token supplied", body = ErrorResponse)
    )
)]
pub async fn logout(
    State(authority): State<TokenAuthority>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, ApiError> {
    let token = bearer_token(&headers).ok_or_else(missing_token)?;
    authority.revoke(token);

    Ok(Json(LogoutResponse {
        message: "Logged out".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }
}
