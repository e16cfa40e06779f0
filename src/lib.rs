//! API key registry
//!
//! Mints opaque `sk_live_` bearer tokens, keeps key records in a persistent
//! store and answers validation lookups:
//! - In-memory or PostgreSQL storage, selected by configuration
//! - Advisory or enforced usage-limit accounting
//! - HTTP API for a key management dashboard and for key validation

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use infrastructure::api_key::ApiKeyService;
use infrastructure::storage::StorageFactory;
use tracing::info;

/// Create the application state with the default (in-memory) configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config.storage.to_storage_config()?;
    info!(backend = ?storage_config.storage_type(), "Storage backend selected");

    let repository = StorageFactory::create_api_key_repository(&storage_config).await?;

    let service = ApiKeyService::new(repository).with_policy(config.registry.usage_policy);
    info!(policy = %service.policy(), "API key service initialized");

    Ok(AppState::new(Arc::new(service)))
}
