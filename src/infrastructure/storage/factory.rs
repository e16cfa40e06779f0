//! Storage factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::domain::api_key::ApiKeyRepository;
use crate::domain::DomainError;
use crate::infrastructure::api_key::{InMemoryApiKeyRepository, PostgresApiKeyRepository};

use super::migrations::run_migrations;
use super::postgres::PostgresConfig;

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// PostgreSQL storage configuration
    Postgres(PostgresConfig),
}

impl StorageConfig {
    /// Creates an in-memory storage configuration
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Creates a PostgreSQL storage configuration
    pub fn postgres(config: PostgresConfig) -> Self {
        Self::Postgres(config)
    }

    /// Creates a PostgreSQL configuration from a URL
    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres(PostgresConfig::new(url))
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Factory for creating the API key store
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates the API key repository described by the configuration
    pub async fn create_api_key_repository(
        config: &StorageConfig,
    ) -> Result<Arc<dyn ApiKeyRepository>, DomainError> {
        match config {
            StorageConfig::InMemory => {
                info!("Using in-memory API key storage");
                Ok(Arc::new(InMemoryApiKeyRepository::new()))
            }
            StorageConfig::Postgres(pg_config) => {
                let pool = pg_config.connect().await?;

                if pg_config.run_migrations {
                    let applied = run_migrations(&pool).await?;
                    info!(applied, "PostgreSQL migrations checked");
                }

                info!("Using PostgreSQL API key storage");
                Ok(Arc::new(PostgresApiKeyRepository::new(pool)))
            }
        }
    }
}
