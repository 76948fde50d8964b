//! Firebase Realtime Database REST backend
//!
//! This module implements the Database trait over the Realtime Database REST API: every node is
//! reachable at `{url}/{path}.json`, written with `PUT`, read with `GET` and removed with
//! `DELETE`.

use crate::database::auth::TokenProvider;
use crate::database::{segments, Database};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// Handle to a Realtime Database instance
///
/// Clones share the HTTP connection pool and the cached access token.
#[derive(Debug, Clone)]
pub struct RealtimeDatabase {
    base: Url,
    http: Client,
    auth: Option<Arc<TokenProvider>>,
}

impl RealtimeDatabase {
    /// Create a handle for the database at `base`
    ///
    /// Without a token provider requests are sent unauthenticated, which suits the local
    /// emulator and databases with public rules.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` unless `base` is an http(s) URL that node paths
    /// can be appended to.
    pub fn new(base: Url, http: Client, auth: Option<TokenProvider>) -> StorageResult<Self> {
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(StorageError::Configuration(format!(
                "database url must be an http(s) address: {base}"
            )));
        }
        Ok(Self {
            base,
            http,
            auth: auth.map(Arc::new),
        })
    }

    /// The database endpoint
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// REST location of the node at `path`
    pub fn node_url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let parts: Vec<&str> = segments(path).collect();
        // `new` only accepts bases with a hierarchical path
        if let Ok(mut url_segments) = url.path_segments_mut() {
            url_segments.pop_if_empty();
            match parts.split_last() {
                Some((last, init)) => {
                    url_segments.extend(init);
                    url_segments.push(&format!("{last}.json"));
                }
                None => {
                    url_segments.push(".json");
                }
            }
        }
        url
    }

    /// Read only the keys directly below `path`
    ///
    /// Used to check that the endpoint answers and accepts our credentials.
    pub async fn read_shallow(&self, path: &str) -> StorageResult<Option<Value>> {
        let mut url = self.node_url(path);
        url.query_pairs_mut().append_pair("shallow", "true");
        let response = self.send(self.http.get(url)).await?;
        json_body(response).await
    }

    async fn send(&self, request: RequestBuilder) -> StorageResult<Response> {
        let request = match &self.auth {
            Some(auth) => request.bearer_auth(auth.token().await?),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %body, "Database request failed");
        Err(StorageError::Transport {
            status: Some(status.as_u16()),
            message: error_message(&body),
        })
    }
}

/// Decode a successful response; the database reports missing nodes as `null`
async fn json_body(response: Response) -> StorageResult<Option<Value>> {
    let body = response.text().await?;
    let value: Value = serde_json::from_str(&body)?;
    Ok((!value.is_null()).then_some(value))
}

/// Pull the message out of an `{"error": "..."}` body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl Database for RealtimeDatabase {
    async fn set(&self, path: &str, value: &Value) -> StorageResult<()> {
        let mut url = self.node_url(path);
        url.query_pairs_mut().append_pair("print", "silent");
        trace!(%url, "PUT");

        self.send(self.http.put(url).json(value)).await?;
        Ok(())
    }

    async fn read(&self, path: &str) -> StorageResult<Option<Value>> {
        let url = self.node_url(path);
        trace!(%url, "GET");

        let response = self.send(self.http.get(url)).await?;
        json_body(response).await
    }

    async fn remove(&self, path: &str) -> StorageResult<()> {
        let mut url = self.node_url(path);
        url.query_pairs_mut().append_pair("print", "silent");
        trace!(%url, "DELETE");

        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn database(base: &str) -> RealtimeDatabase {
        RealtimeDatabase::new(Url::parse(base).unwrap(), Client::new(), None).unwrap()
    }

    #[test]
    fn test_new_rejects_non_hierarchical_base() {
        for base in ["mailto:sessions@example.com", "data:text/plain,x", "ftp://example.com/"] {
            let err = RealtimeDatabase::new(Url::parse(base).unwrap(), Client::new(), None)
                .unwrap_err();
            assert!(
                matches!(err, StorageError::Configuration(_)),
                "{base} should be rejected, got {err}"
            );
        }
    }

    #[test]
    fn test_node_url() {
        let db = database("https://demo.firebaseio.com");
        assert_eq!(
            db.node_url("sessions/abc").as_str(),
            "https://demo.firebaseio.com/sessions/abc.json"
        );
        assert_eq!(
            db.node_url("sessions").as_str(),
            "https://demo.firebaseio.com/sessions.json"
        );
        assert_eq!(db.node_url("").as_str(), "https://demo.firebaseio.com/.json");
    }

    #[test]
    fn test_node_url_with_base_path_and_escaping() {
        let db = database("http://localhost:9000/ns/");
        assert_eq!(
            db.node_url("sessions/a b?c").as_str(),
            "http://localhost:9000/ns/sessions/a%20b%3Fc.json"
        );
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"error": "Permission denied"}"#), "Permission denied");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_set_puts_json() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/sessions/abc.json"))
            .and(query_param("print", "silent"))
            .and(body_json(json!({ "user": "jane" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let db = database(&server.uri());
        db.set("sessions/abc", &json!({ "user": "jane" })).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_existing_and_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions/abc.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": "jane" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sessions/nope.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let db = database(&server.uri());
        assert_eq!(
            db.read("sessions/abc").await.unwrap(),
            Some(json!({ "user": "jane" }))
        );
        assert_eq!(db.read("sessions/nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_deletes() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/sessions.json"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let db = database(&server.uri());
        db.remove("sessions").await.unwrap();
    }

    #[tokio::test]
    async fn test_failure_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "error": "Permission denied" })),
            )
            .mount(&server)
            .await;

        let db = database(&server.uri());
        match db.read("sessions/abc").await.unwrap_err() {
            StorageError::Transport { status, message } => {
                assert_eq!(status, Some(401));
                assert_eq!(message, "Permission denied");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_deserialization_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions/abc.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops"))
            .mount(&server)
            .await;

        let db = database(&server.uri());
        let err = db.read("sessions/abc").await.unwrap_err();
        assert!(
            matches!(err, StorageError::Deserialization(_)),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn test_read_shallow() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions.json"))
            .and(query_param("shallow", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "a": true })))
            .mount(&server)
            .await;

        let db = database(&server.uri());
        assert_eq!(
            db.read_shallow("sessions").await.unwrap(),
            Some(json!({ "a": true }))
        );
    }

    #[tokio::test]
    async fn test_requests_carry_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.token",
                "expires_in": 3599
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sessions/abc.json"))
            .and(header("authorization", "Bearer ya29.token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": "jane" })))
            .expect(1)
            .mount(&server)
            .await;

        let mut key = crate::database::auth::ServiceAccountKey::from_json(include_str!(
            "../../tests/fixtures/service_account.json"
        ))
        .unwrap();
        key.token_uri = format!("{}/token", server.uri());
        let auth = TokenProvider::new(key, Client::new()).unwrap();
        let base = Url::parse(&server.uri()).unwrap();
        let db = RealtimeDatabase::new(base, Client::new(), Some(auth)).unwrap();

        assert!(db.read("sessions/abc").await.unwrap().is_some());
    }
}
