//! Error types for maintrack.
//!
//! This module defines all error types used throughout the maintrack crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for maintrack operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Record Errors ===
    /// Stored or imported JSON could not be decoded.
    #[error("corrupt record under '{key}': {source}")]
    CorruptRecord {
        /// Store key (or `backup` for an imported document).
        key: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A selected equipment index does not exist.
    #[error("equipment index {index} is out of range (have {len} equipment)")]
    InvalidReference {
        /// The index that was requested.
        index: usize,
        /// Number of equipment records at the time of the lookup.
        len: usize,
    },

    /// A dependent record was submitted while no equipment exists.
    #[error("{record} requires at least one registered equipment")]
    EmptyPrerequisite {
        /// Kind of record that was rejected.
        record: &'static str,
    },

    /// A required record field was blank.
    #[error("{record} is missing required field '{field}'")]
    MissingField {
        /// Kind of record being created.
        record: &'static str,
        /// Name of the blank field.
        field: &'static str,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for maintrack operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a corrupt record error for the given key.
    #[must_use]
    pub fn corrupt_record(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::CorruptRecord {
            key: key.into(),
            source,
        }
    }

    /// Create a missing field error.
    #[must_use]
    pub fn missing_field(record: &'static str, field: &'static str) -> Self {
        Self::MissingField { record, field }
    }

    /// Check if this error reports undecodable stored or imported data.
    #[must_use]
    pub fn is_corrupt_record(&self) -> bool {
        matches!(self, Self::CorruptRecord { .. })
    }

    /// Check if this error reports a dangling equipment reference.
    #[must_use]
    pub fn is_invalid_reference(&self) -> bool {
        matches!(self, Self::InvalidReference { .. })
    }

    /// Check if this error reports a submission made before any equipment exists.
    #[must_use]
    pub fn is_empty_prerequisite(&self) -> bool {
        matches!(self, Self::EmptyPrerequisite { .. })
    }
}
