//! In-memory API key repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::api_key::{ApiKeyChanges, ApiKeyId, ApiKeyRecord, ApiKeyRepository, NewApiKey};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Inner {
    /// id -> (insertion sequence, record)
    keys: HashMap<String, (u64, ApiKeyRecord)>,
    next_seq: u64,
}

impl Inner {
    fn value_taken(&self, value: &str, except: Option<&ApiKeyId>) -> bool {
        self.keys
            .values()
            .any(|(_, k)| k.value() == value && Some(k.id()) != except)
    }

    fn find_by_value_mut(&mut self, value: &str) -> Option<&mut ApiKeyRecord> {
        self.keys
            .values_mut()
            .map(|(_, k)| k)
            .find(|k| k.value() == value)
    }
}

/// In-memory implementation of ApiKeyRepository
#[derive(Debug, Default)]
pub struct InMemoryApiKeyRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryApiKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn insert(&self, new_key: NewApiKey) -> Result<ApiKeyRecord, DomainError> {
        let mut inner = self.inner.write().await;

        if inner.value_taken(new_key.value(), None) {
            return Err(DomainError::conflict("An API key with this value already exists"));
        }

        let record = new_key.into_record(ApiKeyId::generate(), Utc::now());
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner
            .keys
            .insert(record.id().as_str().to_string(), (seq, record.clone()));

        Ok(record)
    }

    async fn list(&self) -> Result<Vec<ApiKeyRecord>, DomainError> {
        let inner = self.inner.read().await;

        let mut entries: Vec<&(u64, ApiKeyRecord)> = inner.keys.values().collect();
        entries.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b_seq.cmp(a_seq))
        });

        Ok(entries.into_iter().map(|(_, k)| k.clone()).collect())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.inner.read().await.keys.len())
    }

    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKeyRecord>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner.keys.get(id.as_str()).map(|(_, k)| k.clone()))
    }

    async fn find_by_value(&self, value: &str) -> Result<Option<ApiKeyRecord>, DomainError> {
        let inner = self.inner.read().await;

        let mut matches = inner.keys.values().filter(|(_, k)| k.value() == value);
        let first = matches.next().map(|(_, k)| k.clone());

        if matches.next().is_some() {
            return Err(DomainError::conflict("More than one API key matches this value"));
        }

        Ok(first)
    }

    async fn update(
        &self,
        id: &ApiKeyId,
        changes: &ApiKeyChanges,
    ) -> Result<Option<ApiKeyRecord>, DomainError> {
        let mut inner = self.inner.write().await;

        if !inner.keys.contains_key(id.as_str()) {
            return Ok(None);
        }

        if let Some(value) = &changes.value {
            if inner.value_taken(value, Some(id)) {
                return Err(DomainError::conflict(
                    "An API key with this value already exists",
                ));
            }
        }

        Ok(inner.keys.get_mut(id.as_str()).map(|(_, key)| {
            key.apply(changes);
            key.clone()
        }))
    }

    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let mut inner = self.inner.write().await;
        Ok(inner.keys.remove(id.as_str()).is_some())
    }

    async fn consume_usage(
        &self,
        value: &str,
        used_at: DateTime<Utc>,
    ) -> Result<Option<ApiKeyRecord>, DomainError> {
        let mut inner = self.inner.write().await;

        match inner.find_by_value_mut(value) {
            Some(key) if key.has_remaining_usage() => {
                key.record_use(used_at);
                Ok(Some(key.clone()))
            }
            _ => Ok(None),
        }
    }
}
