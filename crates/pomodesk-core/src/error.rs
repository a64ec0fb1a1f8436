//! Core error types for pomodesk-core.
//!
//! Store mutations and configuration loading report failures through the
//! thiserror enums below. Persistence failures are deliberately absent: a
//! failed write is logged and counted by the store, never returned.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Core error type for pomodesk-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Document store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What kind of record a lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Task,
    Subtask,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Task => f.write_str("task"),
            RecordKind::Subtask => f.write_str("subtask"),
        }
    }
}

/// Document store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record with the given id
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: Uuid },

    /// Rejected input
    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    /// Document written by a newer release
    #[error("Unsupported document version {found} (newest supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Failed to read or write the document file
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document could not be parsed
    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn task_not_found(id: Uuid) -> Self {
        StoreError::NotFound {
            kind: RecordKind::Task,
            id,
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// True when the error is a missing task or subtask.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dotted key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Home or data directory could not be prepared
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
