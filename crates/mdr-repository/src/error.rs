//! Store file error types.
//!
//! Every store operation returns a structured error that carries a
//! user-facing message and an optional remediation hint.

use std::path::PathBuf;
use thiserror::Error;

/// Store file operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O error.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Not an MDR store file, or its content breaks a versioning invariant.
    #[error("Invalid store file format")]
    InvalidFormat { path: PathBuf, reason: String },

    /// Unsupported schema version.
    #[error("Store file version {found} is not supported (maximum: {max_supported})")]
    UnsupportedVersion {
        found: u32,
        max_supported: u32,
        path: PathBuf,
    },

    #[error("Failed to serialize store data")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to deserialize store data")]
    Deserialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The temp file could not be renamed over the target.
    #[error("Failed to complete save operation")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Io {
                operation, path, ..
            } => {
                format!("Could not {} the file at {}", operation, path.display())
            }
            Self::InvalidFormat { path, reason } => {
                format!(
                    "The file at {} is not a valid MDR store: {}",
                    path.display(),
                    reason
                )
            }
            Self::UnsupportedVersion {
                found,
                max_supported,
                ..
            } => {
                format!(
                    "This store was written by a newer version of mdr \
                    (file version {found}, this version supports up to {max_supported})."
                )
            }
            Self::Serialization { .. } => {
                "An error occurred while writing the store data.".to_string()
            }
            Self::Deserialization { path, source } => {
                format!(
                    "The store at {} could not be read (line {}, column {}).",
                    path.display(),
                    source.line(),
                    source.column()
                )
            }
            Self::AtomicWriteFailed { target_path, .. } => {
                format!(
                    "Could not save the store to {}. Please check disk space and permissions.",
                    target_path.display()
                )
            }
        }
    }

    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Io { operation, .. } => {
                if *operation == "read" {
                    Some("Check that the file exists and you have permission to read it.".into())
                } else {
                    Some("Check that you have permission to write to this location.".into())
                }
            }
            Self::InvalidFormat { .. } => {
                Some("Point --config or [store] path at a file written by mdr.".into())
            }
            Self::UnsupportedVersion { .. } => Some("Upgrade mdr to read this store.".into()),
            Self::Serialization { .. } => None,
            Self::Deserialization { .. } => Some("Restore the store from a backup.".into()),
            Self::AtomicWriteFailed { .. } => {
                Some("Free up disk space or save the store to a different location.".into())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
