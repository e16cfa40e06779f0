//! API Key service
//!
//! Provides the caller-facing key lifecycle: minting on create, then
//! delegating storage and validation to the registry.

use std::sync::Arc;

use tracing::info;

use crate::domain::api_key::{
    require_non_negative, require_text, ApiKeyChanges, ApiKeyId, ApiKeyRecord, ApiKeyRepository,
    UsagePolicy,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::{
    record_api_key_created, record_api_key_deleted, record_api_key_validation,
};

use super::minter::KeyMinter;
use super::registry::KeyRegistry;

/// API Key service for managing API keys
#[derive(Debug)]
pub struct ApiKeyService<R>
where
    R: ApiKeyRepository + ?Sized,
{
    registry: KeyRegistry<R>,
    minter: KeyMinter,
}

impl<R: ApiKeyRepository + ?Sized> ApiKeyService<R> {
    /// Create a new API key service
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            registry: KeyRegistry::new(repository),
            minter: KeyMinter::new(),
        }
    }

    /// Create with a custom minter
    pub fn with_minter(mut self, minter: KeyMinter) -> Self {
        self.minter = minter;
        self
    }

    /// Create with a usage policy
    pub fn with_policy(mut self, policy: UsagePolicy) -> Self {
        self.registry = self.registry.with_policy(policy);
        self
    }

    pub fn policy(&self) -> UsagePolicy {
        self.registry.policy()
    }

    /// List all API keys, newest first
    pub async fn list(&self) -> Result<Vec<ApiKeyRecord>, DomainError> {
        self.registry.list().await
    }

    /// Number of stored keys
    pub async fn count(&self) -> Result<usize, DomainError> {
        self.registry.count().await
    }

    /// Get an API key by ID
    pub async fn get(&self, id: &ApiKeyId) -> Result<ApiKeyRecord, DomainError> {
        self.registry.get(id).await
    }

    /// Mint and store a new API key.
    ///
    /// Caller input is checked before any entropy is drawn.
    pub async fn create(
        &self,
        name: &str,
        usage_limit: Option<i64>,
    ) -> Result<ApiKeyRecord, DomainError> {
        require_text("name", name)?;
        require_non_negative("usageLimit", usage_limit)?;

        let value = self.minter.generate()?;

        let created = self.registry.create(name, &value, usage_limit).await?;
        record_api_key_created();

        Ok(created)
    }

    /// Change only the display name
    pub async fn rename(&self, id: &ApiKeyId, name: &str) -> Result<ApiKeyRecord, DomainError> {
        info!(id = %id, "Renaming API key");
        self.registry
            .update(id, ApiKeyChanges::new().with_name(name))
            .await
    }

    /// Apply arbitrary field changes
    pub async fn update(
        &self,
        id: &ApiKeyId,
        changes: ApiKeyChanges,
    ) -> Result<ApiKeyRecord, DomainError> {
        self.registry.update(id, changes).await
    }

    /// Delete an API key
    pub async fn delete(&self, id: &ApiKeyId) -> Result<(), DomainError> {
        self.registry.delete(id).await?;
        record_api_key_deleted();
        Ok(())
    }

    /// Check a presented key
    pub async fn validate(&self, presented: &str) -> bool {
        let valid = self.registry.validate(presented).await;
        record_api_key_validation(valid, self.policy().as_str());
        valid
    }
}
