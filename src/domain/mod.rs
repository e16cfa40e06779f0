//! Domain layer - key records, change sets and the store contract

pub mod api_key;
pub mod error;

pub use api_key::{ApiKeyChanges, ApiKeyId, ApiKeyRecord, NewApiKey, UsagePolicy};
pub use error::DomainError;
