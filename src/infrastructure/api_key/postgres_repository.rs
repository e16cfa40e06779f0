//! PostgreSQL API key repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::domain::api_key::{ApiKeyChanges, ApiKeyId, ApiKeyRecord, ApiKeyRepository, NewApiKey};
use crate::domain::DomainError;

const COLUMNS: &str = "id, name, value, last_used, usage_limit, current_usage, created_at";

/// PostgreSQL implementation of ApiKeyRepository over the `api_keys` table
#[derive(Debug, Clone)]
pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn insert(&self, new_key: NewApiKey) -> Result<ApiKeyRecord, DomainError> {
        let id = ApiKeyId::generate();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO api_keys (id, name, value, usage_limit, current_usage)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id.as_str())
        .bind(new_key.name())
        .bind(new_key.value())
        .bind(new_key.usage_limit())
        .bind(new_key.current_usage())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error("create API key", e))?;

        row_to_record(&row)
    }

    async fn list(&self) -> Result<Vec<ApiKeyRecord>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM api_keys ORDER BY created_at DESC, seq DESC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::store_unavailable(format!("Failed to list API keys: {}", e)))?;

        rows.iter().map(row_to_record).collect()
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_keys")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                DomainError::store_unavailable(format!("Failed to count API keys: {}", e))
            })?;

        Ok(count.max(0) as usize)
    }

    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKeyRecord>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM api_keys WHERE id = $1", COLUMNS))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::store_unavailable(format!("Failed to get API key: {}", e))
            })?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn find_by_value(&self, value: &str) -> Result<Option<ApiKeyRecord>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM api_keys WHERE value = $1 LIMIT 2",
            COLUMNS
        ))
        .bind(value)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::store_unavailable(format!("Failed to look up API key: {}", e))
        })?;

        if rows.len() > 1 {
            return Err(DomainError::conflict("More than one API key matches this value"));
        }

        rows.first().map(row_to_record).transpose()
    }

    async fn update(
        &self,
        id: &ApiKeyId,
        changes: &ApiKeyChanges,
    ) -> Result<Option<ApiKeyRecord>, DomainError> {
        if changes.is_empty() {
            return self.get(id).await;
        }

        let mut builder = build_update(id, changes);

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error("update API key", e))?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::store_unavailable(format!("Failed to delete API key: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn consume_usage(
        &self,
        value: &str,
        used_at: DateTime<Utc>,
    ) -> Result<Option<ApiKeyRecord>, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE api_keys
            SET current_usage = COALESCE(current_usage, 0) + 1, last_used = $2
            WHERE value = $1
              AND usage_limit > 0
              AND COALESCE(current_usage, 0) < usage_limit
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(value)
        .bind(used_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::store_unavailable(format!("Failed to record API key usage: {}", e))
        })?;

        row.as_ref().map(row_to_record).transpose()
    }
}

/// Single-statement `UPDATE ... RETURNING` touching only the changed columns
fn build_update<'a>(id: &'a ApiKeyId, changes: &'a ApiKeyChanges) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE api_keys SET ");

    {
        let mut fields = builder.separated(", ");

        if let Some(name) = &changes.name {
            fields.push("name = ").push_bind_unseparated(name);
        }
        if let Some(value) = &changes.value {
            fields.push("value = ").push_bind_unseparated(value);
        }
        if let Some(last_used) = changes.last_used {
            fields.push("last_used = ").push_bind_unseparated(last_used);
        }
        if let Some(usage_limit) = changes.usage_limit {
            fields.push("usage_limit = ").push_bind_unseparated(usage_limit);
        }
        if let Some(current_usage) = changes.current_usage {
            fields
                .push("current_usage = ")
                .push_bind_unseparated(current_usage);
        }
    }

    builder
        .push(" WHERE id = ")
        .push_bind(id.as_str())
        .push(" RETURNING ")
        .push(COLUMNS);

    builder
}

fn map_write_error(action: &str, e: sqlx::Error) -> DomainError {
    let msg = e.to_string();

    if msg.contains("duplicate key") || msg.contains("unique constraint") {
        DomainError::conflict("An API key with this value already exists")
    } else {
        DomainError::store_unavailable(format!("Failed to {}: {}", action, e))
    }
}

fn row_to_record(row: &PgRow) -> Result<ApiKeyRecord, DomainError> {
    let decode = |e: sqlx::Error| {
        DomainError::store_unavailable(format!("Failed to decode API key row: {}", e))
    };

    let id: String = row.try_get("id").map_err(decode)?;
    let id = ApiKeyId::new(id)
        .map_err(|e| DomainError::internal(format!("Stored API key has invalid id: {}", e)))?;

    Ok(ApiKeyRecord::restore(
        id,
        row.try_get::<String, _>("name").map_err(decode)?,
        row.try_get::<String, _>("value").map_err(decode)?,
        row.try_get::<Option<DateTime<Utc>>, _>("last_used")
            .map_err(decode)?,
        row.try_get::<Option<i64>, _>("usage_limit")
            .map_err(decode)?,
        row.try_get::<Option<i64>, _>("current_usage")
            .map_err(decode)?,
        row.try_get::<DateTime<Utc>, _>("created_at")
            .map_err(decode)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_update_only_changed_columns() {
        let id = ApiKeyId::new("abc-123").unwrap();
        let changes = ApiKeyChanges::new()
            .with_name("Renamed")
            .with_usage_limit(Some(0));

        let builder = build_update(&id, &changes);
        let sql = builder.sql().to_string();

        assert_eq!(
            sql,
            format!(
                "UPDATE api_keys SET name = $1, usage_limit = $2 WHERE id = $3 RETURNING {}",
                COLUMNS
            )
        );
    }

    #[test]
    fn test_build_update_clears_nullable_column() {
        let id = ApiKeyId::new("abc-123").unwrap();
        let changes = ApiKeyChanges::new().with_last_used(None);

        let builder = build_update(&id, &changes);
        let sql = builder.sql().to_string();

        assert!(sql.starts_with("UPDATE api_keys SET last_used = $1 WHERE id = $2"));
    }
}
