//! Firebase-backed session store
//!
//! This module maps the session operations onto path-addressed reads and writes: every session
//! lives at `<collection>/<id>`. Expiry is checked lazily when a session is read; nothing sweeps
//! expired records in the background.

use crate::codec::{compute_expiry, flatten, normalize_inbound};
use crate::config::StoreConfig;
use crate::connector;
use crate::database::realtime::RealtimeDatabase;
use crate::database::Database;
use crate::error::{StorageError, StorageResult};
use crate::session::{Session, EXPIRES, ID};
use crate::storage::SessionStore;
use crate::types::SessionId;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

/// Session store backed by a Realtime Database
///
/// # Examples
///
/// ```
/// use firebase_session::database::memory::MemoryDatabase;
/// use firebase_session::{FirebaseSessionStore, SessionStore, StoreConfig};
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store =
///         FirebaseSessionStore::with_database(MemoryDatabase::new(), StoreConfig::default());
///     store.set("abc", &json!({ "cookie": { "maxAge": 1000 }, "user": "jane" })).await?;
///
///     let session = store.get("abc").await?;
///     assert_eq!(session.get("user"), Some(&json!("jane")));
///     assert_eq!(store.length().await?, 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FirebaseSessionStore<D = RealtimeDatabase> {
    db: D,
    config: StoreConfig,
}

impl FirebaseSessionStore<RealtimeDatabase> {
    /// Connect to the database described by `config`
    ///
    /// The returned store owns its handle; connecting twice yields two independent stores.
    pub async fn connect(config: StoreConfig) -> StorageResult<Self> {
        let db = connector::connect(&config).await?;
        Ok(Self { db, config })
    }
}

impl<D: Database> FirebaseSessionStore<D> {
    /// Build a store on top of an existing database handle
    pub fn with_database(db: D, config: StoreConfig) -> Self {
        Self { db, config }
    }

    /// The store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The underlying database handle
    pub fn database(&self) -> &D {
        &self.db
    }

    fn record_path(&self, id: &SessionId) -> String {
        self.config.collection_name.child(id)
    }

    /// Every record in the collection, normalized
    async fn records(&self) -> StorageResult<Vec<Session>> {
        let collection = self.db.read(self.config.collection_name.as_str()).await?;
        let now = Utc::now();

        let mut sessions = Vec::new();
        for entry in flatten(collection) {
            let Value::Object(record) = normalize_inbound(entry) else {
                warn!(collection = %self.config.collection_name, "Skipping non-object entry");
                continue;
            };
            let session = Session::from_map(record);
            if self.config.hide_expired {
                if has_malformed_expiry(&session) {
                    warn!(session_id = ?session.id(), "Skipping session with malformed expires");
                    continue;
                }
                if session.is_expired_at(now) {
                    continue;
                }
            }
            sessions.push(session);
        }
        Ok(sessions)
    }
}

/// `expires` is present but not a timestamp
fn has_malformed_expiry(session: &Session) -> bool {
    session.get(EXPIRES).is_some() && session.expires().is_none()
}

#[async_trait]
impl<D: Database> SessionStore for FirebaseSessionStore<D> {
    async fn set(&self, id: &str, data: &Value) -> StorageResult<Session> {
        let id = SessionId::new(id)?;
        let record = data.as_object().cloned().ok_or_else(|| {
            StorageError::InvalidInput("session data must be an object".to_string())
        })?;

        let mut record = compute_expiry(record, self.config.ttl())?;
        record.insert(ID.to_string(), Value::String(id.to_string()));
        debug!(session_id = %id, expires = ?record.get(EXPIRES), "Saving session");

        self.db
            .set(&self.record_path(&id), &Value::Object(record.clone()))
            .await?;
        Ok(Session::from_map(record))
    }

    async fn get(&self, id: &str) -> StorageResult<Session> {
        let id = SessionId::new(id)?;
        let raw = self.db.read(&self.record_path(&id)).await?;

        let Some(raw) = raw else {
            debug!(session_id = %id, "No session found");
            return Err(StorageError::NotFound(id.to_string()));
        };
        let Value::Object(record) = normalize_inbound(raw) else {
            return Err(StorageError::Deserialization(format!(
                "session {id} is not an object"
            )));
        };

        let session = Session::from_map(record);
        if has_malformed_expiry(&session) {
            return Err(StorageError::Deserialization(format!(
                "session {id} has a malformed expires attribute"
            )));
        }
        if session.is_expired_at(Utc::now()) {
            debug!(session_id = %id, "Session expired");
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(session)
    }

    async fn destroy(&self, id: &str) -> StorageResult<()> {
        let id = SessionId::new(id)?;
        debug!(session_id = %id, "Destroying session");
        self.db.remove(&self.record_path(&id)).await
    }

    async fn length(&self) -> StorageResult<usize> {
        Ok(self.records().await?.len())
    }

    async fn all(&self) -> StorageResult<Vec<Session>> {
        self.records().await
    }

    async fn clear(&self) -> StorageResult<()> {
        debug!(collection = %self.config.collection_name, "Clearing sessions");
        self.db.remove(self.config.collection_name.as_str()).await
    }
}
