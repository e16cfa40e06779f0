//! API key field validation utilities

use thiserror::Error;

use crate::domain::DomainError;

/// Errors that can occur while validating API key fields
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiKeyValidationError {
    #[error("API key ID cannot be empty")]
    EmptyId,

    #[error("API key ID exceeds maximum length of {0} characters")]
    TooLong(usize),

    #[error("{0} cannot be empty")]
    Blank(&'static str),

    #[error("{0} cannot be negative")]
    Negative(&'static str),
}

impl From<ApiKeyValidationError> for DomainError {
    fn from(err: ApiKeyValidationError) -> Self {
        DomainError::validation(err.to_string())
    }
}

const MAX_API_KEY_ID_LENGTH: usize = 50;

/// Validate an API key ID
///
/// Any non-blank identifier that fits the `api_keys.id` column is accepted.
/// Whether it names a stored key is for the store to answer.
pub fn validate_api_key_id(id: &str) -> Result<(), ApiKeyValidationError> {
    if id.trim().is_empty() {
        return Err(ApiKeyValidationError::EmptyId);
    }

    if id.chars().count() > MAX_API_KEY_ID_LENGTH {
        return Err(ApiKeyValidationError::TooLong(MAX_API_KEY_ID_LENGTH));
    }

    Ok(())
}

/// Trim a required text field, rejecting blank input
pub fn require_text(field: &'static str, raw: &str) -> Result<String, ApiKeyValidationError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(ApiKeyValidationError::Blank(field));
    }

    Ok(trimmed.to_string())
}

/// Reject negative usage counters
pub fn require_non_negative(
    field: &'static str,
    value: Option<i64>,
) -> Result<(), ApiKeyValidationError> {
    match value {
        Some(v) if v < 0 => Err(ApiKeyValidationError::Negative(field)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_api_key_ids() {
        assert!(validate_api_key_id("key123").is_ok());
        assert!(validate_api_key_id("a").is_ok());
        assert!(validate_api_key_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_api_key_id("key_1").is_ok());
        assert!(validate_api_key_id("abc--def").is_ok());
        assert!(validate_api_key_id("-key").is_ok());
    }

    #[test]
    fn test_empty_id() {
        assert_eq!(validate_api_key_id(""), Err(ApiKeyValidationError::EmptyId));
        assert_eq!(validate_api_key_id("   "), Err(ApiKeyValidationError::EmptyId));
    }

    #[test]
    fn test_too_long_id() {
        assert!(validate_api_key_id(&"a".repeat(50)).is_ok());
        assert_eq!(
            validate_api_key_id(&"a".repeat(51)),
            Err(ApiKeyValidationError::TooLong(50))
        );
    }

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("name", "  Billing  ").unwrap(), "Billing");
        assert_eq!(
            require_text("name", " \t "),
            Err(ApiKeyValidationError::Blank("name"))
        );
    }

    #[test]
    fn test_require_non_negative() {
        assert!(require_non_negative("usageLimit", None).is_ok());
        assert!(require_non_negative("usageLimit", Some(0)).is_ok());
        assert_eq!(
            require_non_negative("usageLimit", Some(-1)),
            Err(ApiKeyValidationError::Negative("usageLimit"))
        );
    }

    #[test]
    fn test_into_domain_error() {
        let err: DomainError = ApiKeyValidationError::Blank("name").into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Validation error: name cannot be empty");
    }
}
