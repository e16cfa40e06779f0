//! Database migrations infrastructure

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// Applies versioned migrations, recording them in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the migrations table if it doesn't exist
    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                success BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::store_unavailable(format!("Failed to create migrations table: {}", e))
        })?;

        Ok(())
    }

    /// Runs a single migration; returns whether it was newly applied
    pub async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
                .bind(migration.version)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::store_unavailable(format!(
                        "Failed to check migration status: {}",
                        e
                    ))
                })?;

        if applied {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::store_unavailable(format!("Failed to start migration transaction: {}", e))
        })?;

        sqlx::raw_sql(&migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::store_unavailable(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::store_unavailable(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit().await.map_err(|e| {
            DomainError::store_unavailable(format!(
                "Failed to commit migration {}: {}",
                migration.version, e
            ))
        })?;

        info!(version = migration.version, description = %migration.description, "Applied migration");

        Ok(true)
    }

    /// Returns the latest applied migration version
    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        let version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM _migrations WHERE success = TRUE")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::store_unavailable(format!(
                        "Failed to get migration version: {}",
                        e
                    ))
                })?;

        Ok(version)
    }

    /// Returns all applied migration versions
    pub async fn applied_versions(&self) -> Result<Vec<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        let versions: Vec<i64> = sqlx::query_scalar(
            "SELECT version FROM _migrations WHERE success = TRUE ORDER BY version",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::store_unavailable(format!("Failed to get applied migrations: {}", e))
        })?;

        Ok(versions)
    }
}

/// Represents a database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version
    pub version: i64,
    /// Human-readable description
    pub description: String,
    /// SQL to run when applying the migration
    pub up: String,
}

impl Migration {
    pub fn new(version: i64, description: impl Into<String>, up: impl Into<String>) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
        }
    }
}

/// Schema for the API key store
pub fn api_key_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "Create api_keys table",
            r#"
            CREATE TABLE IF NOT EXISTS api_keys (
                id VARCHAR(50) PRIMARY KEY,
                seq BIGSERIAL NOT NULL,
                name TEXT NOT NULL,
                value TEXT NOT NULL,
                last_used TIMESTAMPTZ NULL,
                usage_limit BIGINT NULL CHECK (usage_limit >= 0),
                current_usage BIGINT NULL CHECK (current_usage >= 0),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_api_keys_created_at ON api_keys(created_at DESC, seq DESC);
            "#,
        ),
        Migration::new(
            2,
            "Enforce unique api_keys.value",
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_api_keys_value ON api_keys(value);
            "#,
        ),
    ]
}

/// Versions from `migrations` that are not in `applied`
pub fn pending_versions(migrations: &[Migration], applied: &[i64]) -> Vec<i64> {
    migrations
        .iter()
        .map(|m| m.version)
        .filter(|v| !applied.contains(v))
        .collect()
}

/// Runs all pending API key migrations; returns how many were applied
pub async fn run_migrations(pool: &PgPool) -> Result<usize, DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());
    let mut applied = 0;

    for migration in api_key_migrations() {
        if migrator.run_migration(&migration).await? {
            applied += 1;
        }
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creation() {
        let migration = Migration::new(1, "Test migration", "CREATE TABLE test");

        assert_eq!(migration.version, 1);
        assert_eq!(migration.description, "Test migration");
        assert_eq!(migration.up, "CREATE TABLE test");
    }

    #[test]
    fn test_api_key_migrations_order() {
        let migrations = api_key_migrations();

        assert!(!migrations.is_empty());

        for i in 1..migrations.len() {
            assert!(
                migrations[i].version > migrations[i - 1].version,
                "Migrations should be in ascending order"
            );
        }
    }

    #[test]
    fn test_api_key_schema_columns() {
        let schema = &api_key_migrations()[0].up;

        for column in [
            "id", "seq", "name", "value", "last_used", "usage_limit", "current_usage",
            "created_at",
        ] {
            assert!(schema.contains(column), "missing column {}", column);
        }
    }

    #[test]
    fn test_value_is_unique() {
        let migrations = api_key_migrations();
        assert!(migrations
            .iter()
            .any(|m| m.up.contains("UNIQUE INDEX") && m.up.contains("(value)")));
    }

    #[test]
    fn test_pending_versions() {
        let migrations = api_key_migrations();

        assert_eq!(pending_versions(&migrations, &[]), vec![1, 2]);
        assert_eq!(pending_versions(&migrations, &[1]), vec![2]);
        assert!(pending_versions(&migrations, &[1, 2]).is_empty());
    }
}
