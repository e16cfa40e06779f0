use serde::Deserialize;

use crate::domain::api_key::UsagePolicy;
use crate::domain::DomainError;
use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::storage::{PostgresConfig, StorageConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS; empty allows any origin
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Store selection and PostgreSQL pool settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// `memory` or `postgres`
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Falls back to `DATABASE_URL` when unset
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub usage_policy: UsagePolicy,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            database_url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            run_migrations: true,
        }
    }
}

impl StorageSettings {
    /// Resolve into a concrete backend configuration
    pub fn to_storage_config(&self) -> Result<StorageConfig, DomainError> {
        let storage_type = StorageType::parse(&self.backend).ok_or_else(|| {
            DomainError::configuration(format!("Unknown storage backend '{}'", self.backend))
        })?;

        match storage_type {
            StorageType::InMemory => Ok(StorageConfig::in_memory()),
            StorageType::Postgres => {
                let url = self.database_url.as_deref().ok_or_else(|| {
                    DomainError::configuration(
                        "storage.database_url or DATABASE_URL is required for the postgres backend",
                    )
                })?;

                Ok(StorageConfig::postgres(
                    PostgresConfig::new(url)
                        .with_max_connections(self.max_connections)
                        .with_min_connections(self.min_connections)
                        .with_connect_timeout(self.connect_timeout_secs)
                        .with_idle_timeout(self.idle_timeout_secs)
                        .with_migrations(self.run_migrations),
                ))
            }
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_allowed_origins"),
            )
            .build()?;

        let mut app_config: Self = config.try_deserialize()?;
        app_config.apply_database_url_fallback(std::env::var("DATABASE_URL").ok());

        Ok(app_config)
    }

    fn apply_database_url_fallback(&mut self, database_url: Option<String>) {
        if self.storage.database_url.is_none() {
            self.storage.database_url = database_url.filter(|url| !url.trim().is_empty());
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
