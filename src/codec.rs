//! Data normalization at the database boundary
//!
//! Outbound records get their expiry computed and mirrored into the cookie. Inbound records get
//! explicit 64-bit integer wrappers unwrapped into plain numbers, and keyed collections are
//! flattened into ordered lists.

use crate::error::{StorageError, StorageResult};
use crate::session::{parse_timestamp, COOKIE, EXPIRES, ORIGINAL_MAX_AGE};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::{json, Map, Value};

/// A 64-bit integer stored as two 32-bit halves
///
/// Serialized as `{"type": "int64", "low": <u32>, "high": <i32>}` so that counters wider than a
/// double's mantissa survive a trip through the database. Reads hand the value back as a plain
/// JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Int64 {
    low: u32,
    high: i32,
}

impl Int64 {
    /// Split a value into its halves
    pub fn new(value: i64) -> Self {
        Self {
            low: value as u32,
            high: (value >> 32) as i32,
        }
    }

    /// Reassemble the value
    pub fn get(self) -> i64 {
        (i64::from(self.high) << 32) | i64::from(self.low)
    }

    /// Decode a stored wrapper, if `value` is exactly one
    pub fn from_tagged(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.len() != 3 || map.get("type")?.as_str()? != "int64" {
            return None;
        }
        let low = u32::try_from(map.get("low")?.as_u64()?).ok()?;
        let high = i32::try_from(map.get("high")?.as_i64()?).ok()?;
        Some(Self { low, high })
    }
}

impl Serialize for Int64 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Int64", 3)?;
        state.serialize_field("type", "int64")?;
        state.serialize_field("low", &self.low)?;
        state.serialize_field("high", &self.high)?;
        state.end()
    }
}

impl From<i64> for Int64 {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<Int64> for i64 {
    fn from(value: Int64) -> Self {
        value.get()
    }
}

impl From<Int64> for Value {
    fn from(value: Int64) -> Self {
        json!({ "type": "int64", "low": value.low, "high": value.high })
    }
}

/// Unwrap 64-bit integer wrappers in the top-level attributes of a record
///
/// Null and non-object values are returned unchanged.
pub fn normalize_inbound(raw: Value) -> Value {
    match raw {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| match Int64::from_tagged(&value) {
                    Some(wrapped) => (key, Value::from(wrapped.get())),
                    None => (key, value),
                })
                .collect(),
        ),
        other => other,
    }
}

/// Values of a keyed collection in the collection's iteration order
///
/// The database returns children sorted by key; arrays (which it produces for integer-like
/// keys) flatten to their non-null elements. Anything else is an empty collection.
pub fn flatten(collection: Option<Value>) -> Vec<Value> {
    match collection {
        Some(Value::Object(map)) => map.into_iter().map(|(_, value)| value).collect(),
        Some(Value::Array(items)) => items.into_iter().filter(|v| !v.is_null()).collect(),
        _ => Vec::new(),
    }
}

/// Format a timestamp the way records store it
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Compute and inject the expiry of a record about to be written
///
/// See [`compute_expiry_at`].
pub fn compute_expiry(
    record: Map<String, Value>,
    ttl: Duration,
) -> StorageResult<Map<String, Value>> {
    compute_expiry_at(record, ttl, Utc::now())
}

/// Compute and inject the expiry of a record as of `now`
///
/// `cookie.expires` wins when set; otherwise the record expires `ttl` after `now`. `null`, `false`,
/// `0` and `""` count as unset, which is how browser-session cookies arrive. The result is
/// written to both `expires` and `cookie.expires`, and `cookie.originalMaxAge` defaults to `""`.
pub fn compute_expiry_at(
    mut record: Map<String, Value>,
    ttl: Duration,
    now: DateTime<Utc>,
) -> StorageResult<Map<String, Value>> {
    let cookie = record
        .get_mut(COOKIE)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            StorageError::InvalidInput("session data must contain a cookie object".to_string())
        })?;

    let expires = match cookie.get(EXPIRES) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => expiry_from_ttl(now, ttl)?,
        Some(Value::String(s)) if s.is_empty() => expiry_from_ttl(now, ttl)?,
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => expiry_from_ttl(now, ttl)?,
        Some(value) => parse_timestamp(value).ok_or_else(|| {
            StorageError::InvalidInput(format!("unrecognized cookie.expires value: {}", value))
        })?,
    };
    let expires = Value::String(format_timestamp(expires));

    cookie.insert(EXPIRES.to_string(), expires.clone());
    let max_age = cookie.entry(ORIGINAL_MAX_AGE).or_insert(Value::Null);
    if max_age.is_null() {
        *max_age = Value::String(String::new());
    }

    record.insert(EXPIRES.to_string(), expires);
    Ok(record)
}

fn expiry_from_ttl(now: DateTime<Utc>, ttl: Duration) -> StorageResult<DateTime<Utc>> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| StorageError::Configuration(format!("ttl of {ttl} is out of range")))
}
