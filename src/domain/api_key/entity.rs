//! API key record and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::changes::ApiKeyChanges;
use super::validation::{
    require_non_negative, require_text, validate_api_key_id, ApiKeyValidationError,
};

/// Prefix carried by every minted key
pub const KEY_PREFIX: &str = "sk_live_";

const MASK: &str = "••••••••";
const VISIBLE_SUFFIX: usize = 4;

/// API key identifier - non-blank, trimmed, max 50 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiKeyId(String);

impl ApiKeyId {
    /// Create an ApiKeyId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, ApiKeyValidationError> {
        let id = id.into();
        validate_api_key_id(&id)?;
        Ok(Self(id.trim().to_string()))
    }

    /// Assign a fresh identifier (store side)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ApiKeyId {
    type Error = ApiKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ApiKeyId> for String {
    fn from(id: ApiKeyId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated payload for inserting a new key
#[derive(Debug, Clone, PartialEq)]
pub struct NewApiKey {
    name: String,
    value: String,
    usage_limit: Option<i64>,
    current_usage: Option<i64>,
}

impl NewApiKey {
    /// Build an insert payload.
    ///
    /// Name and value are trimmed and must not be blank. When a usage limit is
    /// given the usage counter starts at zero; otherwise neither is set.
    pub fn new(
        name: &str,
        value: &str,
        usage_limit: Option<i64>,
    ) -> Result<Self, ApiKeyValidationError> {
        let name = require_text("name", name)?;
        let value = require_text("value", value)?;
        require_non_negative("usageLimit", usage_limit)?;

        Ok(Self {
            name,
            value,
            usage_limit,
            current_usage: usage_limit.map(|_| 0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn usage_limit(&self) -> Option<i64> {
        self.usage_limit
    }

    pub fn current_usage(&self) -> Option<i64> {
        self.current_usage
    }

    /// Materialize the record once the store has assigned identity
    pub fn into_record(self, id: ApiKeyId, created_at: DateTime<Utc>) -> ApiKeyRecord {
        ApiKeyRecord {
            id,
            name: self.name,
            value: self.value,
            last_used: None,
            usage_limit: self.usage_limit,
            current_usage: self.current_usage,
            created_at,
        }
    }
}

/// A stored API key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    id: ApiKeyId,
    name: String,
    /// The bearer token a caller must present
    value: String,
    /// None means the key has never been used
    #[serde(skip_serializing_if = "Option::is_none")]
    last_used: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_usage: Option<i64>,
    /// Ordering only
    created_at: DateTime<Utc>,
}

impl ApiKeyRecord {
    /// Rebuild a record read back from a store
    pub fn restore(
        id: ApiKeyId,
        name: impl Into<String>,
        value: impl Into<String>,
        last_used: Option<DateTime<Utc>>,
        usage_limit: Option<i64>,
        current_usage: Option<i64>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            value: value.into(),
            last_used,
            usage_limit,
            current_usage,
            created_at,
        }
    }

    // Getters

    pub fn id(&self) -> &ApiKeyId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn last_used(&self) -> Option<DateTime<Utc>> {
        self.last_used
    }

    pub fn usage_limit(&self) -> Option<i64> {
        self.usage_limit
    }

    pub fn current_usage(&self) -> Option<i64> {
        self.current_usage
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // Validation predicates

    /// Admission under the advisory policy: a usage limit is set and positive.
    ///
    /// The usage counter is not consulted.
    pub fn admits(&self) -> bool {
        matches!(self.usage_limit, Some(limit) if limit > 0)
    }

    /// Admission under the enforced policy: positive limit with budget left
    pub fn has_remaining_usage(&self) -> bool {
        match self.usage_limit {
            Some(limit) if limit > 0 => self.current_usage.unwrap_or(0) < limit,
            _ => false,
        }
    }

    // Mutators

    /// Apply a validated change set in place
    pub fn apply(&mut self, changes: &ApiKeyChanges) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }

        if let Some(value) = &changes.value {
            self.value = value.clone();
        }

        if let Some(last_used) = changes.last_used {
            self.last_used = last_used;
        }

        if let Some(usage_limit) = changes.usage_limit {
            self.usage_limit = usage_limit;
        }

        if let Some(current_usage) = changes.current_usage {
            self.current_usage = current_usage;
        }
    }

    /// Count one use and stamp the time
    pub fn record_use(&mut self, at: DateTime<Utc>) {
        self.current_usage = Some(self.current_usage.unwrap_or(0) + 1);
        self.last_used = Some(at);
    }

    /// Display form of the value: known prefix plus the last four characters
    pub fn masked_value(&self) -> String {
        mask_value(&self.value)
    }
}

/// Hide all but the recognizable parts of a key value
pub fn mask_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();

    if chars.len() <= VISIBLE_SUFFIX * 2 {
        return MASK.to_string();
    }

    let suffix: String = chars[chars.len() - VISIBLE_SUFFIX..].iter().collect();

    match value.strip_prefix(KEY_PREFIX) {
        Some(rest) if rest.chars().count() > VISIBLE_SUFFIX => {
            format!("{}{}{}", KEY_PREFIX, MASK, suffix)
        }
        _ => format!("{}{}", MASK, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(usage_limit: Option<i64>, current_usage: Option<i64>) -> ApiKeyRecord {
        ApiKeyRecord::restore(
            ApiKeyId::generate(),
            "Test Key",
            "sk_live_abcdefghijklmnop",
            None,
            usage_limit,
            current_usage,
            Utc::now(),
        )
    }

    #[test]
    fn test_api_key_id_valid() {
        let id = ApiKeyId::new("my-api-key-1").unwrap();
        assert_eq!(id.as_str(), "my-api-key-1");
    }

    #[test]
    fn test_api_key_id_trimmed() {
        assert_eq!(ApiKeyId::new("  key_1 ").unwrap().as_str(), "key_1");
    }

    #[test]
    fn test_api_key_id_invalid() {
        assert!(ApiKeyId::new("").is_err());
        assert!(ApiKeyId::new(" \t").is_err());
        assert!(ApiKeyId::new("a".repeat(51)).is_err());
    }

    #[test]
    fn test_generated_ids_are_valid_and_distinct() {
        let a = ApiKeyId::generate();
        let b = ApiKeyId::generate();

        assert!(ApiKeyId::new(a.as_str()).is_ok());
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_key_with_limit_starts_usage_at_zero() {
        let new_key = NewApiKey::new("  Billing ", " sk_live_x ", Some(5)).unwrap();

        assert_eq!(new_key.name(), "Billing");
        assert_eq!(new_key.value(), "sk_live_x");
        assert_eq!(new_key.usage_limit(), Some(5));
        assert_eq!(new_key.current_usage(), Some(0));
    }

    #[test]
    fn test_new_key_without_limit_sets_no_usage_fields() {
        let new_key = NewApiKey::new("Billing", "sk_live_x", None).unwrap();

        assert_eq!(new_key.usage_limit(), None);
        assert_eq!(new_key.current_usage(), None);
    }

    #[test]
    fn test_new_key_rejects_blank_fields() {
        assert_eq!(
            NewApiKey::new("   ", "sk_live_x", None),
            Err(ApiKeyValidationError::Blank("name"))
        );
        assert_eq!(
            NewApiKey::new("Billing", "", None),
            Err(ApiKeyValidationError::Blank("value"))
        );
        assert_eq!(
            NewApiKey::new("Billing", "sk_live_x", Some(-3)),
            Err(ApiKeyValidationError::Negative("usageLimit"))
        );
    }

    #[test]
    fn test_into_record_is_never_used() {
        let id = ApiKeyId::generate();
        let record = NewApiKey::new("Billing", "sk_live_x", Some(1))
            .unwrap()
            .into_record(id.clone(), Utc::now());

        assert_eq!(record.id(), &id);
        assert!(record.last_used().is_none());
    }

    #[test]
    fn test_admits_requires_positive_limit() {
        assert!(record(Some(5), Some(0)).admits());
        assert!(!record(None, None).admits());
        assert!(!record(Some(0), Some(0)).admits());
        assert!(!record(Some(-1), None).admits());
    }

    #[test]
    fn test_admits_ignores_current_usage() {
        assert!(record(Some(5), Some(1_000_000)).admits());
    }

    #[test]
    fn test_has_remaining_usage() {
        assert!(record(Some(2), Some(1)).has_remaining_usage());
        assert!(record(Some(2), None).has_remaining_usage());
        assert!(!record(Some(2), Some(2)).has_remaining_usage());
        assert!(!record(None, None).has_remaining_usage());
        assert!(!record(Some(0), Some(0)).has_remaining_usage());
    }

    #[test]
    fn test_apply_changes() {
        let mut key = record(Some(5), Some(0));
        let now = Utc::now();
        let changes = ApiKeyChanges::new()
            .with_name("Renamed")
            .with_usage_limit(None)
            .with_last_used(Some(now));

        key.apply(&changes);

        assert_eq!(key.name(), "Renamed");
        assert_eq!(key.usage_limit(), None);
        assert_eq!(key.current_usage(), Some(0));
        assert_eq!(key.last_used(), Some(now));
        assert_eq!(key.value(), "sk_live_abcdefghijklmnop");
    }

    #[test]
    fn test_record_use() {
        let mut key = record(Some(5), None);
        let now = Utc::now();

        key.record_use(now);
        key.record_use(now);

        assert_eq!(key.current_usage(), Some(2));
        assert_eq!(key.last_used(), Some(now));
    }

    #[test]
    fn test_masked_value() {
        assert_eq!(record(None, None).masked_value(), "sk_live_••••••••mnop");
        assert_eq!(mask_value("custom-secret-1234"), "••••••••1234");
        assert_eq!(mask_value("short"), "••••••••");
        assert_eq!(mask_value("sk_live_abcd"), "••••••••abcd");
    }
}
