//! Session storage
//!
//! This module provides the trait-based abstraction the session middleware talks to, allowing
//! different backend implementations behind the same six operations.

use crate::error::{StorageError, StorageResult};
use crate::session::Session;
use async_trait::async_trait;
use serde_json::Value;

pub mod firebase;

/// Trait for session storage backends
///
/// This trait defines the interface that a session middleware uses to persist sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create or fully replace a session
    ///
    /// # Arguments
    ///
    /// * `id` - The session ID, also the storage key
    /// * `data` - The session object; must contain a `cookie` object
    ///
    /// # Returns
    ///
    /// The record as written, with `expires` computed, or a storage error
    async fn set(&self, id: &str, data: &Value) -> StorageResult<Session>;

    /// Get a live session by ID
    ///
    /// # Returns
    ///
    /// The session, [`StorageError::NotFound`] if it is missing or expired, or another storage
    /// error if the database could not be read
    async fn get(&self, id: &str) -> StorageResult<Session>;

    /// Delete a session by ID
    ///
    /// Deleting a session that does not exist succeeds.
    async fn destroy(&self, id: &str) -> StorageResult<()>;

    /// Count the stored sessions
    async fn length(&self) -> StorageResult<usize>;

    /// List the stored sessions
    async fn all(&self) -> StorageResult<Vec<Session>>;

    /// Delete every session
    async fn clear(&self) -> StorageResult<()>;

    /// Get a live session by ID, mapping a miss to `None`
    ///
    /// # Returns
    ///
    /// The session if found, None if missing or expired, or a storage error
    async fn find(&self, id: &str) -> StorageResult<Option<Session>> {
        match self.get(id).await {
            Ok(session) => Ok(Some(session)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
