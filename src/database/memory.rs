//! In-memory database implementation
//!
//! This module provides a thread-safe, in-memory implementation of the Database trait: a single
//! JSON tree protected by an async RwLock. It follows the Realtime Database storage rules that
//! matter to callers: null values are never stored and empty nodes disappear.

use crate::database::{segments, Database};
use crate::error::StorageResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;

/// In-memory database
///
/// Suitable for development, testing, and single-process deployments. Clones share the same
/// tree.
///
/// # Examples
///
/// ```
/// use firebase_session::database::{memory::MemoryDatabase, Database};
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = MemoryDatabase::new();
///     db.set("sessions/abc", &json!({ "user": "jane" })).await?;
///
///     let value = db.read("sessions").await?;
///     assert_eq!(value, Some(json!({ "abc": { "user": "jane" } })));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    root: Arc<RwLock<Map<String, Value>>>,
}

impl MemoryDatabase {
    /// Create a new, empty database
    pub fn new() -> Self {
        Self {
            root: Arc::new(RwLock::new(Map::new())),
        }
    }

    /// Check if the database holds no data at all
    pub async fn is_empty(&self) -> bool {
        self.root.read().await.is_empty()
    }

    /// Copy of the whole tree
    ///
    /// This is primarily useful for testing purposes.
    pub async fn snapshot(&self) -> Value {
        Value::Object(self.root.read().await.clone())
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop nulls and empty objects the way the database does on write
fn prune(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .filter_map(|(key, child)| prune(child).map(|child| (key, child)))
                .collect();
            (!map.is_empty()).then_some(Value::Object(map))
        }
        other => Some(other),
    }
}

/// Remove the node at `path`, then drop any ancestors left empty
fn remove_at(node: &mut Map<String, Value>, path: &[&str]) {
    let Some((first, rest)) = path.split_first() else {
        node.clear();
        return;
    };
    if rest.is_empty() {
        node.remove(*first);
        return;
    }
    if let Some(Value::Object(child)) = node.get_mut(*first) {
        remove_at(child, rest);
        if child.is_empty() {
            node.remove(*first);
        }
    }
}

/// Place `value` at `path`, creating or overwriting intermediate nodes
fn insert_at(node: &mut Map<String, Value>, path: &[&str], value: Value) {
    match path {
        [] => {
            if let Value::Object(map) = value {
                *node = map;
            }
        }
        [last] => {
            node.insert((*last).to_string(), value);
        }
        [first, rest @ ..] => {
            let child = node
                .entry(*first)
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                insert_at(child, rest, value);
            }
        }
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn set(&self, path: &str, value: &Value) -> StorageResult<()> {
        let parts: Vec<&str> = segments(path).collect();
        trace!(path, "Writing node");

        let mut root = self.root.write().await;
        match prune(value.clone()) {
            Some(value) if !parts.is_empty() || value.is_object() => {
                insert_at(&mut root, &parts, value)
            }
            _ => remove_at(&mut root, &parts),
        }
        Ok(())
    }

    async fn read(&self, path: &str) -> StorageResult<Option<Value>> {
        trace!(path, "Reading node");

        let root = self.root.read().await;
        let mut node: Option<&Value> = None;
        let mut current = &*root;
        let mut parts = segments(path).peekable();
        if parts.peek().is_none() {
            return Ok((!root.is_empty()).then(|| Value::Object(root.clone())));
        }
        while let Some(part) = parts.next() {
            node = current.get(part);
            match node {
                Some(Value::Object(child)) => current = child,
                Some(_) if parts.peek().is_none() => break,
                _ => return Ok(None),
            }
        }
        Ok(node.cloned())
    }

    async fn remove(&self, path: &str) -> StorageResult<()> {
        let parts: Vec<&str> = segments(path).collect();
        trace!(path, "Removing node");

        remove_at(&mut *self.root.write().await, &parts);
        Ok(())
    }
}
