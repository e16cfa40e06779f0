//! Public v1 endpoints

pub mod validate;

use axum::{routing::get, Router};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new().route(
        "/validate",
        get(validate::validate_key_from_headers).post(validate::validate_key),
    )
}
