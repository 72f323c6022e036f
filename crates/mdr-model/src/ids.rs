#![deny(unsafe_code)]

use std::fmt;

use crate::MdrError;

/// Stable external identifier of a library item, independent of its version.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    pub fn new(value: impl Into<String>) -> Result<Self, MdrError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(MdrError::invalid_value("library item", "uid", value));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Builds the canonical `{prefix}_{counter:06}` form.
    pub fn from_counter(prefix: &str, counter: u64) -> Self {
        Self(format!("{prefix}_{counter:06}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the actor performing a change.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    pub fn new(value: impl Into<String>) -> Result<Self, MdrError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MdrError::invalid_value("item metadata", "author_id", value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
