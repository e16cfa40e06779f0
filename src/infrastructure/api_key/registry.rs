//! Key registry
//!
//! The authoritative contract for storing, mutating and validating API key
//! records. Holds no state of its own beyond the store handle and the usage
//! policy.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::api_key::{
    mask_value, ApiKeyChanges, ApiKeyId, ApiKeyRecord, ApiKeyRepository, NewApiKey, UsagePolicy,
};
use crate::domain::DomainError;

/// Loggable form of a presented key, masked like listed values
pub(crate) fn key_hint(value: &str) -> String {
    mask_value(value)
}

/// Registry of API keys backed by a repository
#[derive(Debug)]
pub struct KeyRegistry<R: ApiKeyRepository + ?Sized> {
    repository: Arc<R>,
    policy: UsagePolicy,
}

impl<R: ApiKeyRepository + ?Sized> Clone for KeyRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            policy: self.policy,
        }
    }
}

impl<R: ApiKeyRepository + ?Sized> KeyRegistry<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            policy: UsagePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UsagePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> UsagePolicy {
        self.policy
    }

    /// All keys, newest first
    pub async fn list(&self) -> Result<Vec<ApiKeyRecord>, DomainError> {
        let keys = self.repository.list().await?;
        debug!(count = keys.len(), "Listed API keys");
        Ok(keys)
    }

    /// Number of stored keys
    pub async fn count(&self) -> Result<usize, DomainError> {
        self.repository.count().await
    }

    /// Fetch a single key
    pub async fn get(&self, id: &ApiKeyId) -> Result<ApiKeyRecord, DomainError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))
    }

    /// Persist a new key.
    ///
    /// Inputs are checked before the store is contacted. The counter starts
    /// at zero only when a limit is given.
    pub async fn create(
        &self,
        name: &str,
        value: &str,
        usage_limit: Option<i64>,
    ) -> Result<ApiKeyRecord, DomainError> {
        let new_key = NewApiKey::new(name, value, usage_limit)?;

        let created = self.repository.insert(new_key).await?;

        info!(
            id = %created.id(),
            name = %created.name(),
            usage_limit = ?created.usage_limit(),
            "API key created"
        );

        Ok(created)
    }

    /// Apply field changes in one store round trip
    pub async fn update(
        &self,
        id: &ApiKeyId,
        changes: ApiKeyChanges,
    ) -> Result<ApiKeyRecord, DomainError> {
        let changes = changes.normalized()?;

        let updated = self
            .repository
            .update(id, &changes)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))?;

        info!(id = %id, fields = ?changes.field_names(), "API key updated");

        Ok(updated)
    }

    /// Remove a key. Removing a key that does not exist is not an error.
    pub async fn delete(&self, id: &ApiKeyId) -> Result<(), DomainError> {
        let removed = self.repository.delete(id).await?;

        if removed {
            info!(id = %id, "API key deleted");
        } else {
            debug!(id = %id, "API key already absent");
        }

        Ok(())
    }

    /// Decide whether a presented key is admitted.
    ///
    /// Every failure, including store errors, is reported as `false`.
    pub async fn validate(&self, presented: &str) -> bool {
        let presented = presented.trim();

        if presented.is_empty() {
            debug!("Blank API key presented");
            return false;
        }

        let outcome = match self.policy {
            UsagePolicy::Advisory => self
                .repository
                .find_by_value(presented)
                .await
                .map(|found| found.is_some_and(|key| key.admits())),
            UsagePolicy::Enforced => self
                .repository
                .consume_usage(presented, Utc::now())
                .await
                .map(|consumed| consumed.is_some()),
        };

        match outcome {
            Ok(valid) => {
                debug!(key = %key_hint(presented), policy = %self.policy, valid, "API key validated");
                valid
            }
            Err(e) => {
                warn!(key = %key_hint(presented), error = %e, "API key validation failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api_key::MockApiKeyRepository;
    use crate::infrastructure::api_key::InMemoryApiKeyRepository;
    use serde_json::json;

    fn registry() -> KeyRegistry<InMemoryApiKeyRepository> {
        KeyRegistry::new(Arc::new(InMemoryApiKeyRepository::new()))
    }

    fn enforced_registry() -> KeyRegistry<InMemoryApiKeyRepository> {
        registry().with_policy(UsagePolicy::Enforced)
    }

    fn untouched_store() -> MockApiKeyRepository {
        let mut repo = MockApiKeyRepository::new();
        repo.expect_insert().never();
        repo.expect_update().never();
        repo.expect_find_by_value().never();
        repo.expect_consume_usage().never();
        repo
    }

    #[test]
    fn test_key_hint() {
        let hint = key_hint("sk_live_abcdefghijk");
        assert_eq!(hint, "sk_live_••••••••hijk");
        assert!(!hint.contains("abcd"));
        assert_eq!(key_hint("short"), "••••••••");
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let registry = registry();

        let created = registry
            .create("Prod", "sk_live_aaaaaaaaaaaaaaaa", Some(5))
            .await
            .unwrap();

        let keys = registry.list().await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].id(), created.id());
        assert_eq!(keys[0].name(), "Prod");
        assert_eq!(keys[0].usage_limit(), Some(5));
        assert_eq!(keys[0].current_usage(), Some(0));
        assert_eq!(keys[0].last_used(), None);
    }

    #[tokio::test]
    async fn test_create_without_limit() {
        let registry = registry();

        let created = registry
            .create("Dev", "sk_live_bbbbbbbbbbbbbbbb", None)
            .await
            .unwrap();

        assert_eq!(created.usage_limit(), None);
        assert_eq!(created.current_usage(), None);
        assert!(!registry.validate("sk_live_bbbbbbbbbbbbbbbb").await);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let registry = registry();

        for (name, value) in [("A", "sk_live_a"), ("B", "sk_live_b"), ("C", "sk_live_c")] {
            registry.create(name, value, None).await.unwrap();
        }

        let names: Vec<String> = registry
            .list()
            .await
            .unwrap()
            .iter()
            .map(|k| k.name().to_string())
            .collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name_before_store() {
        let registry = KeyRegistry::new(Arc::new(untouched_store()));

        let err = registry.create("   ", "sk_live_x", None).await.unwrap_err();
        assert!(err.is_validation());

        let err = registry.create("Prod", "", None).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_create_rejects_negative_limit_before_store() {
        let registry = KeyRegistry::new(Arc::new(untouched_store()));

        let err = registry
            .create("Prod", "sk_live_x", Some(-1))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_create_store_failure() {
        let mut repo = MockApiKeyRepository::new();
        repo.expect_insert()
            .times(1)
            .returning(|_| Err(DomainError::store_unavailable("connection refused")));

        let registry = KeyRegistry::new(Arc::new(repo));
        let err = registry.create("Prod", "sk_live_x", None).await.unwrap_err();

        assert!(matches!(err, DomainError::StoreUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_list_store_failure() {
        let mut repo = MockApiKeyRepository::new();
        repo.expect_list()
            .returning(|| Err(DomainError::store_unavailable("timeout")));

        let registry = KeyRegistry::new(Arc::new(repo));
        assert!(matches!(
            registry.list().await,
            Err(DomainError::StoreUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let registry = registry();
        let err = registry.get(&ApiKeyId::generate()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_rename() {
        let registry = registry();
        let created = registry.create("Old", "sk_live_x", None).await.unwrap();

        let updated = registry
            .update(created.id(), ApiKeyChanges::new().with_name("  New  "))
            .await
            .unwrap();

        assert_eq!(updated.name(), "New");
        assert_eq!(updated.value(), "sk_live_x");
        assert_eq!(registry.get(created.id()).await.unwrap().name(), "New");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let registry = registry();

        let err = registry
            .update(&ApiKeyId::generate(), ApiKeyChanges::new().with_name("New"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_rejects_before_store() {
        let registry = KeyRegistry::new(Arc::new(untouched_store()));
        let id = ApiKeyId::new("key-1").unwrap();

        let blank_name = ApiKeyChanges::new().with_name(" ");
        assert!(registry.update(&id, blank_name).await.unwrap_err().is_validation());

        let negative = ApiKeyChanges::new().with_current_usage(Some(-3));
        assert!(registry.update(&id, negative).await.unwrap_err().is_validation());

        let empty = ApiKeyChanges::new();
        assert!(registry.update(&id, empty).await.unwrap_err().is_validation());
    }

    #[test]
    fn test_update_unknown_field_rejected() {
        let fields = match json!({ "name": "New", "scopes": ["admin"] }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };

        let err = ApiKeyChanges::from_fields(fields).unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_update_value_collision() {
        let registry = registry();
        registry.create("A", "sk_live_a", None).await.unwrap();
        let b = registry.create("B", "sk_live_b", None).await.unwrap();

        let err = registry
            .update(b.id(), ApiKeyChanges::new().with_value("sk_live_a"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let registry = registry();
        let created = registry.create("Prod", "sk_live_x", Some(1)).await.unwrap();

        registry.delete(created.id()).await.unwrap();
        registry.delete(created.id()).await.unwrap();

        assert!(registry.list().await.unwrap().is_empty());
        assert!(!registry.validate("sk_live_x").await);
    }

    #[tokio::test]
    async fn test_validate_advisory_ignores_counter() {
        let registry = registry();
        let created = registry.create("Prod", "sk_live_x", Some(5)).await.unwrap();

        registry
            .update(created.id(), ApiKeyChanges::new().with_current_usage(Some(99)))
            .await
            .unwrap();

        assert!(registry.validate("sk_live_x").await);
        assert!(registry.validate("  sk_live_x\n").await);

        let after = registry.get(created.id()).await.unwrap();
        assert_eq!(after.current_usage(), Some(99));
        assert_eq!(after.last_used(), None);
    }

    #[tokio::test]
    async fn test_validate_zero_limit() {
        let registry = registry();
        registry.create("Prod", "sk_live_x", Some(0)).await.unwrap();

        assert!(!registry.validate("sk_live_x").await);
    }

    #[tokio::test]
    async fn test_validate_unknown_and_blank() {
        let offline = KeyRegistry::new(Arc::new(untouched_store()));
        assert!(!offline.validate("").await);
        assert!(!offline.validate("   ").await);

        assert!(!registry().validate("not_a_real_key").await);
    }

    #[tokio::test]
    async fn test_validate_store_error_is_false() {
        let mut repo = MockApiKeyRepository::new();
        repo.expect_find_by_value()
            .returning(|_| Err(DomainError::store_unavailable("connection reset")));

        let registry = KeyRegistry::new(Arc::new(repo));
        assert!(!registry.validate("sk_live_x").await);
    }

    #[tokio::test]
    async fn test_validate_ambiguous_is_false() {
        let mut repo = MockApiKeyRepository::new();
        repo.expect_find_by_value()
            .returning(|_| Err(DomainError::conflict("More than one API key matches this value")));

        let registry = KeyRegistry::new(Arc::new(repo));
        assert!(!registry.validate("sk_live_x").await);
    }

    #[tokio::test]
    async fn test_validate_enforced_counts_uses() {
        let registry = enforced_registry();
        let created = registry.create("Prod", "sk_live_x", Some(2)).await.unwrap();

        assert!(registry.validate("sk_live_x").await);
        assert!(registry.validate("sk_live_x").await);
        assert!(!registry.validate("sk_live_x").await);

        let after = registry.get(created.id()).await.unwrap();
        assert_eq!(after.current_usage(), Some(2));
        assert!(after.last_used().is_some());
    }

    #[tokio::test]
    async fn test_validate_enforced_store_error_is_false() {
        let mut repo = MockApiKeyRepository::new();
        repo.expect_find_by_value().never();
        repo.expect_consume_usage()
            .times(1)
            .returning(|_, _| Err(DomainError::store_unavailable("timeout")));

        let registry = KeyRegistry::new(Arc::new(repo)).with_policy(UsagePolicy::Enforced);
        assert!(!registry.validate("sk_live_x").await);
    }
}
