//! Partial updates to an API key record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::validation::{require_non_negative, require_text};
use crate::domain::DomainError;

/// Field changes for an update.
///
/// `None` leaves a field untouched. For the nullable fields the inner option
/// distinguishes "set to null" (`Some(None)`) from "not mentioned" (`None`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApiKeyChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, alias = "last_used", deserialize_with = "present")]
    pub last_used: Option<Option<DateTime<Utc>>>,
    #[serde(default, alias = "usage_limit", deserialize_with = "present")]
    pub usage_limit: Option<Option<i64>>,
    #[serde(default, alias = "current_usage", deserialize_with = "present")]
    pub current_usage: Option<Option<i64>>,
}

/// Marks a field that appeared in the payload, even when its value is null
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ApiKeyChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a field-name to value mapping; unrecognized keys are rejected
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, DomainError> {
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| DomainError::validation(format!("Invalid field changes: {}", e)))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_last_used(mut self, last_used: Option<DateTime<Utc>>) -> Self {
        self.last_used = Some(last_used);
        self
    }

    pub fn with_usage_limit(mut self, usage_limit: Option<i64>) -> Self {
        self.usage_limit = Some(usage_limit);
        self
    }

    pub fn with_current_usage(mut self, current_usage: Option<i64>) -> Self {
        self.current_usage = Some(current_usage);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }

    /// Store column names of the fields being changed
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();

        if self.name.is_some() {
            names.push("name");
        }
        if self.value.is_some() {
            names.push("value");
        }
        if self.last_used.is_some() {
            names.push("last_used");
        }
        if self.usage_limit.is_some() {
            names.push("usage_limit");
        }
        if self.current_usage.is_some() {
            names.push("current_usage");
        }

        names
    }

    /// Validate and trim, producing the change set sent to the store
    pub fn normalized(self) -> Result<Self, DomainError> {
        if self.is_empty() {
            return Err(DomainError::validation("No fields to update"));
        }

        let name = self
            .name
            .as_deref()
            .map(|n| require_text("name", n))
            .transpose()?;
        let value = self
            .value
            .as_deref()
            .map(|v| require_text("value", v))
            .transpose()?;

        require_non_negative("usageLimit", self.usage_limit.flatten())?;
        require_non_negative("currentUsage", self.current_usage.flatten())?;

        Ok(Self {
            name,
            value,
            ..self
        })
    }
}
