//! Database backends
//!
//! This module provides the trait-based abstraction over the remote document store: a tree of
//! JSON values addressed by `/`-separated paths. Implementations wrap a real client; they do not
//! reimplement the database.

use crate::error::StorageResult;
use async_trait::async_trait;
use serde_json::Value;

pub mod auth;
pub mod memory;
pub mod realtime;

/// Path-addressed access to a hierarchical JSON store
///
/// Every call issues exactly one request and completes when the store acknowledges it.
#[async_trait]
pub trait Database: Send + Sync {
    /// Replace the value at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - `/`-separated location of the node
    /// * `value` - The new value; intermediate nodes are created as needed
    async fn set(&self, path: &str, value: &Value) -> StorageResult<()>;

    /// Read the value at `path` once
    ///
    /// # Returns
    ///
    /// The value if the node exists, None if it does not, or a storage error
    async fn read(&self, path: &str) -> StorageResult<Option<Value>>;

    /// Remove the node at `path` and everything below it
    ///
    /// Removing a missing node succeeds.
    async fn remove(&self, path: &str) -> StorageResult<()>;
}

/// Split a path into its non-empty segments
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}
