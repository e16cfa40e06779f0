//! Admin API endpoints backing the key management dashboard

pub mod api_keys;

use axum::{
    routing::{get, put},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api-keys",
            get(api_keys::list_api_keys).post(api_keys::create_api_key),
        )
        .route(
            "/api-keys/{key_id}",
            get(api_keys::get_api_key)
                .patch(api_keys::update_api_key)
                .delete(api_keys::delete_api_key),
        )
        .route("/api-keys/{key_id}/name", put(api_keys::rename_api_key))
}
