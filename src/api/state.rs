//! Application state for shared services

use std::sync::Arc;

use crate::domain::api_key::{
    ApiKeyChanges, ApiKeyId, ApiKeyRecord, ApiKeyRepository, UsagePolicy,
};
use crate::domain::DomainError;
use crate::infrastructure::api_key::ApiKeyService;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub api_key_service: Arc<dyn ApiKeyServiceTrait>,
}

/// Trait for API key service operations, addressed by raw identifiers
#[async_trait::async_trait]
pub trait ApiKeyServiceTrait: Send + Sync {
    async fn list(&self) -> Result<Vec<ApiKeyRecord>, DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
    async fn get(&self, id: &str) -> Result<ApiKeyRecord, DomainError>;
    async fn create(
        &self,
        name: &str,
        usage_limit: Option<i64>,
    ) -> Result<ApiKeyRecord, DomainError>;
    async fn rename(&self, id: &str, name: &str) -> Result<ApiKeyRecord, DomainError>;
    async fn update(&self, id: &str, changes: ApiKeyChanges)
    -> Result<ApiKeyRecord, DomainError>;
    async fn delete(&self, id: &str) -> Result<(), DomainError>;
    async fn validate(&self, key: &str) -> bool;
    fn usage_policy(&self) -> UsagePolicy;
}

/// `None` for ids that cannot name a stored key
fn lookup_id(id: &str) -> Option<ApiKeyId> {
    ApiKeyId::new(id).ok()
}

fn unknown_key(id: &str) -> DomainError {
    DomainError::not_found(format!("API key '{}' not found", id))
}

#[async_trait::async_trait]
impl<R: ApiKeyRepository + ?Sized + 'static> ApiKeyServiceTrait for ApiKeyService<R> {
    async fn list(&self) -> Result<Vec<ApiKeyRecord>, DomainError> {
        ApiKeyService::list(self).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        ApiKeyService::count(self).await
    }

    async fn get(&self, id: &str) -> Result<ApiKeyRecord, DomainError> {
        let key_id = lookup_id(id).ok_or_else(|| unknown_key(id))?;
        ApiKeyService::get(self, &key_id).await
    }

    async fn create(
        &self,
        name: &str,
        usage_limit: Option<i64>,
    ) -> Result<ApiKeyRecord, DomainError> {
        ApiKeyService::create(self, name, usage_limit).await
    }

    async fn rename(&self, id: &str, name: &str) -> Result<ApiKeyRecord, DomainError> {
        match lookup_id(id) {
            Some(key_id) => ApiKeyService::rename(self, &key_id, name).await,
            None => {
                ApiKeyChanges::new().with_name(name).normalized()?;
                Err(unknown_key(id))
            }
        }
    }

    async fn update(
        &self,
        id: &str,
        changes: ApiKeyChanges,
    ) -> Result<ApiKeyRecord, DomainError> {
        match lookup_id(id) {
            Some(key_id) => ApiKeyService::update(self, &key_id, changes).await,
            None => {
                changes.normalized()?;
                Err(unknown_key(id))
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        match lookup_id(id) {
            Some(key_id) => ApiKeyService::delete(self, &key_id).await,
            None => Ok(()),
        }
    }

    async fn validate(&self, key: &str) -> bool {
        ApiKeyService::validate(self, key).await
    }

    fn usage_policy(&self) -> UsagePolicy {
        self.policy()
    }
}

impl AppState {
    /// Create new application state with provided services
    pub fn new(api_key_service: Arc<dyn ApiKeyServiceTrait>) -> Self {
        Self { api_key_service }
    }
}
