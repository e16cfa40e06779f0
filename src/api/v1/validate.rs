//! Key validation endpoints
//!
//! Both forms always answer 200 with a boolean; a missing or unreadable key
//! is simply not valid.

use axum::{
    extract::State,
    http::{header, HeaderMap},
};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};

/// Body for POST /v1/validate
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateKeyRequest {
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateKeyResponse {
    pub valid: bool,
}

/// POST /v1/validate
pub async fn validate_key(
    State(state): State<AppState>,
    request: Result<Json<ValidateKeyRequest>, ApiError>,
) -> Json<ValidateKeyResponse> {
    let valid = match request {
        Ok(Json(request)) => state.api_key_service.validate(&request.key).await,
        Err(_) => false,
    };

    Json(ValidateKeyResponse { valid })
}

/// GET /v1/validate
pub async fn validate_key_from_headers(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<ValidateKeyResponse> {
    let valid = match extract_api_key_from_headers(&headers) {
        Some(key) => state.api_key_service.validate(&key).await,
        None => false,
    };

    Json(ValidateKeyResponse { valid })
}

/// Key from `Authorization: Bearer <key>`, falling back to `X-API-Key`
fn extract_api_key_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    bearer.or_else(|| {
        headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(|key| key.trim().to_string())
    })
}
