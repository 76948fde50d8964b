//! Establishing a database handle
//!
//! [`connect`] turns a [`StoreConfig`] into a [`RealtimeDatabase`] handle owned by the caller.
//! Nothing is registered globally, so any number of handles may coexist in one process.

use crate::config::StoreConfig;
use crate::database::auth::TokenProvider;
use crate::database::realtime::RealtimeDatabase;
use crate::error::{StorageError, StorageResult};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{info, warn};

/// Build a handle to the database described by `config`
///
/// Fails with [`StorageError::Connection`] when the endpoint URL is missing or malformed, the
/// credential cannot be used, or the endpoint cannot be reached.
pub async fn connect(config: &StoreConfig) -> StorageResult<RealtimeDatabase> {
    let url = parse_endpoint(config.url.as_deref())?;

    let mut builder = Client::builder();
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let http = builder
        .build()
        .map_err(|e| StorageError::Connection(format!("cannot build HTTP client: {e}")))?;

    let auth = config
        .cert
        .clone()
        .map(|key| TokenProvider::new(key, http.clone()))
        .transpose()?;

    if let Some(auth) = &auth {
        auth.token().await.map_err(|e| {
            warn!(client_email = %auth.client_email(), error = %e, "Credential rejected");
            StorageError::Connection(format!("credential rejected: {e}"))
        })?;
    }

    let db = RealtimeDatabase::new(url, http, auth)?;
    db.read_shallow(config.collection_name.as_str())
        .await
        .map_err(|e| StorageError::Connection(format!("database unreachable: {e}")))?;

    info!(
        url = %db.base_url(),
        collection = %config.collection_name,
        authenticated = config.cert.is_some(),
        "Connected to database"
    );
    Ok(db)
}

fn parse_endpoint(url: Option<&str>) -> StorageResult<Url> {
    let url = url.ok_or_else(|| StorageError::Connection("database url is not set".to_string()))?;
    let parsed = Url::parse(url)
        .map_err(|e| StorageError::Connection(format!("invalid database url {url:?}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
        return Err(StorageError::Connection(format!(
            "database url must be an http(s) address: {url:?}"
        )));
    }
    Ok(parsed)
}
