//! API key store contract

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

#[cfg(test)]
use mockall::automock;

use super::changes::ApiKeyChanges;
use super::entity::{ApiKeyId, ApiKeyRecord, NewApiKey};
use crate::domain::DomainError;

/// Persistent store for API key records.
///
/// Implementations assign `id` and `created_at` on insert and must keep
/// `value` unique, reporting collisions as `DomainError::Conflict`. Transport
/// and storage failures surface as `DomainError::StoreUnavailable`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ApiKeyRepository: Send + Sync + Debug {
    /// Insert a new record and return it as stored
    async fn insert(&self, new_key: NewApiKey) -> Result<ApiKeyRecord, DomainError>;

    /// All records, newest first
    async fn list(&self) -> Result<Vec<ApiKeyRecord>, DomainError>;

    /// Number of stored records, without loading them
    async fn count(&self) -> Result<usize, DomainError>;

    /// Look up a record by identifier
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKeyRecord>, DomainError>;

    /// Look up the single record whose value matches exactly.
    ///
    /// More than one match is reported as `DomainError::Conflict`.
    async fn find_by_value(&self, value: &str) -> Result<Option<ApiKeyRecord>, DomainError>;

    /// Apply changes in one round trip; `None` if the id does not exist
    async fn update(
        &self,
        id: &ApiKeyId,
        changes: &ApiKeyChanges,
    ) -> Result<Option<ApiKeyRecord>, DomainError>;

    /// Remove a record; returns whether anything was deleted
    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError>;

    /// Conditionally count one use of the key with this value.
    ///
    /// Succeeds only when the limit is positive and the counter is below it,
    /// incrementing the counter and stamping `last_used` atomically.
    /// Returns `None` when the key is unknown or exhausted.
    async fn consume_usage(
        &self,
        value: &str,
        used_at: DateTime<Utc>,
    ) -> Result<Option<ApiKeyRecord>, DomainError>;
}
