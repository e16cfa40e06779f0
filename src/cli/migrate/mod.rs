//! Migrate command - applies or reports PostgreSQL schema migrations

use anyhow::{bail, Context};
use clap::Args;

use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::storage::{
    api_key_migrations, pending_versions, run_migrations, PostgresMigrator, StorageConfig,
};

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Report the current version instead of migrating
    #[arg(long)]
    pub status: bool,
}

pub async fn run(args: &MigrateArgs) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging);

    let pg_config = match config.storage.to_storage_config()? {
        StorageConfig::Postgres(pg_config) => pg_config,
        StorageConfig::InMemory => {
            bail!("Migrations require the postgres storage backend (storage.backend)")
        }
    };

    let pool = pg_config.connect().await?;

    if args.status {
        let migrator = PostgresMigrator::new(pool);
        let applied = migrator.applied_versions().await?;
        let pending = pending_versions(&api_key_migrations(), &applied);

        match migrator.current_version().await? {
            Some(version) => println!("Current version: {}", version),
            None => println!("Current version: none"),
        }
        println!("Pending migrations: {:?}", pending);

        return Ok(());
    }

    let applied = run_migrations(&pool).await?;
    println!("Applied {} migration(s)", applied);

    Ok(())
}
