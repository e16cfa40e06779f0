//! Storage infrastructure - backend selection, pooling and migrations

mod factory;
pub mod migrations;
mod postgres;

pub use factory::{StorageConfig, StorageFactory, StorageType};
pub use migrations::{
    api_key_migrations, pending_versions, run_migrations, Migration, PostgresMigrator,
};
pub use postgres::PostgresConfig;
