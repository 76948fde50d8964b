//! Session records
//!
//! A session is an arbitrary JSON object owned by the middleware. The store only relies on a
//! handful of well-known attributes: the nested `cookie`, the computed `expires` timestamp and
//! the `_id` stamp that mirrors the storage key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute holding the cookie settings
pub const COOKIE: &str = "cookie";
/// Attribute holding the absolute expiry timestamp
pub const EXPIRES: &str = "expires";
/// Attribute holding the session id stamp
pub const ID: &str = "_id";
/// Cookie attribute holding the original max age
pub const ORIGINAL_MAX_AGE: &str = "originalMaxAge";

/// A stored session record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(Map<String, Value>);

impl Session {
    /// Wrap an attribute map
    pub fn from_map(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    /// The id stamped on the record at write time
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID).and_then(Value::as_str)
    }

    /// The absolute expiry, if present and well formed
    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.0.get(EXPIRES).and_then(parse_timestamp)
    }

    /// Whether the record has expired at `now`
    ///
    /// Records without an `expires` attribute never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires().is_some_and(|expires| expires <= now)
    }

    /// The nested cookie object
    pub fn cookie(&self) -> Option<&Map<String, Value>> {
        self.0.get(COOKIE).and_then(Value::as_object)
    }

    /// Look up a top-level attribute
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrow the full attribute map
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Take the full attribute map
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Session> for Value {
    fn from(session: Session) -> Self {
        Value::Object(session.0)
    }
}

/// Parse a stored or caller-supplied timestamp
///
/// Accepts RFC 3339 strings and integer epoch milliseconds.
pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
