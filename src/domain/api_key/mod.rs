//! API key domain
//!
//! Record types, partial-update change sets, the usage policy and the store
//! contract used by the key registry.

mod changes;
mod entity;
mod policy;
mod repository;
mod validation;

pub use changes::ApiKeyChanges;
pub use entity::{mask_value, ApiKeyId, ApiKeyRecord, NewApiKey, KEY_PREFIX};
pub use policy::UsagePolicy;
pub use repository::ApiKeyRepository;
pub use validation::{
    require_non_negative, require_text, validate_api_key_id, ApiKeyValidationError,
};

#[cfg(test)]
pub use repository::MockApiKeyRepository;
