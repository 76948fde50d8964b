//! Error types for the session store
//!
//! This module provides the storage error taxonomy using thiserror. Every failure from the
//! remote database is handed back to the caller as-is; nothing here retries or recovers.

use thiserror::Error;

/// Storage-related errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StorageError {
    /// Connection failed (bad credential, bad endpoint, endpoint unreachable)
    #[error("Storage connection failed: {0}")]
    Connection(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Session missing or expired
    #[error("Session not found: {0}")]
    NotFound(String),

    /// A read, write or remove against the remote database failed
    #[error("Storage transport failed{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Invalid session id or session payload
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization failed
    #[error("Storage serialization failed: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Storage deserialization failed: {0}")]
    Deserialization(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl StorageError {
    /// Build a transport error that carries no HTTP status
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// True when the error is the expected "no such session" miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True when the error came from talking to the remote database
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Self::Deserialization(err.to_string())
        } else {
            Self::Serialization(err.to_string())
        }
    }
}

/// Type alias for Storage Result
pub type StorageResult<T> = std::result::Result<T, StorageError>;
