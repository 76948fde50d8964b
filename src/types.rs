//! Common type definitions used throughout the session store
//!
//! This module provides the validated key types used to address records in the database.

use crate::error::StorageError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Realtime Database keys may not contain `.`, `$`, `#`, `[`, `]`, `/` or control characters.
fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^.$#\[\]/\x00-\x1F\x7F]+$").expect("key pattern is a valid regex")
    })
}

/// Check whether `key` is usable as a single database path segment
pub fn is_valid_key(key: &str) -> bool {
    key_pattern().is_match(key)
}

/// Identifier of a stored session
///
/// Assigned by the session middleware, never generated here. It doubles as the record's
/// key under the session collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Validate and wrap a session id
    pub fn new(id: impl Into<String>) -> Result<Self, StorageError> {
        let id = id.into();
        if id.is_empty() {
            return Err(StorageError::InvalidInput(
                "session id must not be empty".to_string(),
            ));
        }
        if !is_valid_key(&id) {
            return Err(StorageError::InvalidInput(format!(
                "session id {:?} contains characters not allowed in a database key",
                id
            )));
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = StorageError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl TryFrom<&str> for SessionId {
    type Error = StorageError;

    fn try_from(id: &str) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

/// Path of the collection that holds every session record
///
/// One or more valid keys joined by `/`, e.g. `sessions` or `apps/shop/sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Validate a collection path
    pub fn new(path: impl Into<String>) -> Result<Self, StorageError> {
        let path = path.into();
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() || !trimmed.split('/').all(is_valid_key) {
            return Err(StorageError::Configuration(format!(
                "invalid collection name {:?}",
                path
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Path of the record for `id` inside this collection
    pub fn child(&self, id: &SessionId) -> String {
        format!("{}/{}", self.0, id)
    }

    /// Get the path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CollectionPath {
    fn default() -> Self {
        Self("sessions".to_string())
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CollectionPath {
    type Error = StorageError;

    fn try_from(path: String) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

impl From<CollectionPath> for String {
    fn from(path: CollectionPath) -> Self {
        path.0
    }
}
