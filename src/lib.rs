//! # firebase-session - Firebase Realtime Database session store
//!
//! A pluggable backing store for HTTP session middleware. Sessions are kept as JSON records in
//! a Firebase Realtime Database, one record per session id under a configurable collection,
//! with expiry computed at write time and checked lazily on read.
//!
//! ## Features
//!
//! - **Six operations**: `set`, `get`, `destroy`, `length`, `all`, `clear` behind the
//!   [`SessionStore`] trait
//! - **Expiry**: taken from the session cookie, or `now + ttl` (14 days by default)
//! - **Owned handles**: [`FirebaseSessionStore::connect`] returns a store the caller owns; no
//!   global application registry
//! - **Service accounts**: OAuth2 access tokens minted from a service account key and cached
//! - **Testable**: the [`Database`] trait has an in-memory implementation for tests and local
//!   development
//!
//! ## Quick Start
//!
//! ```no_run
//! use firebase_session::{FirebaseSessionStore, ServiceAccountKey, SessionStore, StoreConfig};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::new("https://my-app-default-rtdb.firebaseio.com")
//!     .with_cert(ServiceAccountKey::from_file("service-account.json")?)
//!     .with_ttl_secs(60 * 60 * 24);
//!
//! let store = FirebaseSessionStore::connect(config).await?;
//!
//! store
//!     .set("s3cr3t-id", &json!({ "cookie": { "maxAge": 86400000 }, "user": "jane" }))
//!     .await?;
//!
//! match store.find("s3cr3t-id").await? {
//!     Some(session) => println!("welcome back {}", session.get("user").unwrap()),
//!     None => println!("session expired"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! middleware ──▶ SessionStore (set/get/destroy/length/all/clear)
//!                    │
//!                    ├── codec: expiry, Int64 unwrapping, flattening
//!                    │
//!                    └── Database (set/read/remove by path)
//!                          ├── RealtimeDatabase (REST + service account)
//!                          └── MemoryDatabase
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: The session store trait and the Firebase-backed implementation
//! - [`codec`]: Normalization of records crossing the database boundary
//! - [`database`]: Database abstraction, REST client, auth and in-memory backend
//! - [`connector`]: Building a database handle from configuration
//! - [`config`]: Store configuration
//! - [`session`]: Session records
//! - [`types`]: Validated keys
//! - [`error`]: Error types and result aliases
//!
//! ## License
//!
//! Licensed under either of Apache License 2.0 or MIT license at your option.

// Validated keys
pub mod types;

// Error types
pub mod error;

// Configuration
pub mod config;

// Session records
pub mod session;

// Boundary normalization
pub mod codec;

// Database backends
pub mod database;

// Handle construction
pub mod connector;

// Session storage
pub mod storage;

pub use codec::Int64;
pub use config::StoreConfig;
pub use connector::connect;
pub use database::{
    auth::ServiceAccountKey, memory::MemoryDatabase, realtime::RealtimeDatabase, Database,
};
pub use error::{StorageError, StorageResult};
pub use session::Session;
pub use storage::{firebase::FirebaseSessionStore, SessionStore};
pub use types::{CollectionPath, SessionId};
