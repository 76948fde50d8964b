//! Store configuration
//!
//! Options recognized by [`FirebaseSessionStore`](crate::FirebaseSessionStore) and the connector.

use crate::database::auth::ServiceAccountKey;
use crate::error::StorageError;
use crate::types::CollectionPath;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Default session lifetime when the cookie carries no expiry: 14 days
pub const DEFAULT_TTL_SECS: u64 = 60 * 60 * 24 * 14;

/// Configuration for a session store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database endpoint, e.g. `https://my-app-default-rtdb.firebaseio.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Service account credential; requests are unauthenticated without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<ServiceAccountKey>,
    /// Path of the collection holding session records
    #[serde(default)]
    pub collection_name: CollectionPath,
    /// Lifetime, in seconds, of sessions whose cookie has no expiry
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Leave expired records out of `length` and `all`
    ///
    /// Records whose `expires` is not a timestamp are left out as well, matching `get`.
    #[serde(default)]
    pub hide_expired: bool,
    /// Per-request HTTP timeout, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            cert: None,
            collection_name: CollectionPath::default(),
            ttl_secs: default_ttl_secs(),
            hide_expired: false,
            request_timeout_secs: None,
        }
    }
}

impl StoreConfig {
    /// Create a configuration for the given database endpoint
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Build a configuration from the environment
    ///
    /// Reads `FIREBASE_DATABASE_URL` (required), `GOOGLE_APPLICATION_CREDENTIALS` (path to a
    /// service account JSON file), `SESSION_COLLECTION` and `SESSION_TTL_SECS`.
    pub fn from_env() -> Result<Self, StorageError> {
        let url = std::env::var("FIREBASE_DATABASE_URL").map_err(|_| {
            StorageError::Configuration(
                "FIREBASE_DATABASE_URL environment variable not set".to_string(),
            )
        })?;
        let mut config = Self::new(url);

        if let Ok(path) = std::env::var("GOOGLE_APPLICATION_CREDENTIALS") {
            config.cert = Some(ServiceAccountKey::from_file(path)?);
        }
        if let Ok(collection) = std::env::var("SESSION_COLLECTION") {
            config.collection_name = CollectionPath::new(collection)?;
        }
        if let Ok(ttl) = std::env::var("SESSION_TTL_SECS") {
            config.ttl_secs = ttl.parse().map_err(|_| {
                StorageError::Configuration(format!("SESSION_TTL_SECS is not a number: {ttl}"))
            })?;
        }

        Ok(config)
    }

    /// Set the service account credential
    pub fn with_cert(mut self, cert: ServiceAccountKey) -> Self {
        self.cert = Some(cert);
        self
    }

    /// Set the collection name
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Result<Self, StorageError> {
        self.collection_name = CollectionPath::new(name)?;
        Ok(self)
    }

    /// Set the default session lifetime in seconds
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Leave expired records out of `length` and `all`
    pub fn with_hide_expired(mut self, hide_expired: bool) -> Self {
        self.hide_expired = hide_expired;
        self
    }

    /// Set the per-request HTTP timeout
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// The default session lifetime as a duration
    pub fn ttl(&self) -> Duration {
        i64::try_from(self.ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = StoreConfig::new("https://demo.firebaseio.com");
        assert_eq!(config.url.as_deref(), Some("https://demo.firebaseio.com"));
        assert!(config.cert.is_none());
        assert_eq!(config.collection_name.as_str(), "sessions");
        assert_eq!(config.ttl_secs, 1_209_600);
        assert_eq!(config.ttl(), Duration::days(14));
        assert!(!config.hide_expired);
    }

    #[test]
    fn test_config_builders() {
        let config = StoreConfig::new("https://demo.firebaseio.com")
            .with_collection_name("apps/shop/sessions")
            .unwrap()
            .with_ttl_secs(60)
            .with_hide_expired(true)
            .with_request_timeout_secs(5);

        assert_eq!(config.collection_name.as_str(), "apps/shop/sessions");
        assert_eq!(config.ttl(), Duration::seconds(60));
        assert!(config.hide_expired);
        assert_eq!(config.request_timeout_secs, Some(5));
    }

    #[test]
    fn test_config_rejects_bad_collection() {
        let result = StoreConfig::default().with_collection_name("bad.name");
        assert!(matches!(result, Err(StorageError::Configuration(_))));
    }

    #[test]
    fn test_config_deserialization_fills_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{ "url": "https://demo.firebaseio.com" }"#).unwrap();
        assert_eq!(config.collection_name.as_str(), "sessions");
        assert_eq!(config.ttl_secs, DEFAULT_TTL_SECS);

        let config: StoreConfig =
            serde_json::from_str(r#"{ "collection_name": "web", "ttl_secs": 30 }"#).unwrap();
        assert_eq!(config.collection_name.as_str(), "web");
        assert_eq!(config.ttl_secs, 30);
        assert!(config.url.is_none());
    }

    #[test]
    fn test_config_deserialization_validates_collection() {
        let result = serde_json::from_str::<StoreConfig>(r#"{ "collection_name": "a#b" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let config = StoreConfig::default().with_ttl_secs(u64::MAX);
        assert!(config.ttl() > Duration::days(365));
    }
}
