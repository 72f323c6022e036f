//! Store loading.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{CURRENT_SCHEMA_VERSION, STORE_FORMAT, StoreFile};
use crate::catalog::Catalog;
use crate::error::{Result, StoreError};

#[derive(Deserialize)]
struct Header {
    format: Option<String>,
    schema_version: Option<u32>,
}

/// Reads a store from `path` and rebuilds its catalog.
pub fn load_store(path: &Path) -> Result<Catalog> {
    let bytes = fs::read(path).map_err(|e| StoreError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source: e,
    })?;

    let store = parse_store_bytes(&bytes, path)?;
    let catalog = store
        .into_catalog()
        .map_err(|e| StoreError::InvalidFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    tracing::info!(path = %path.display(), "loaded store");
    Ok(catalog)
}

/// Checks the header before decoding the body so that a foreign or newer
/// file is reported as such rather than as a decoding error.
fn parse_store_bytes(bytes: &[u8], path: &Path) -> Result<StoreFile> {
    let header: Header = serde_json::from_slice(bytes).map_err(|_| StoreError::InvalidFormat {
        path: path.to_path_buf(),
        reason: "Not a JSON object".to_string(),
    })?;

    if header.format.as_deref() != Some(STORE_FORMAT) {
        return Err(StoreError::InvalidFormat {
            path: path.to_path_buf(),
            reason: format!("Missing \"format\": \"{STORE_FORMAT}\" header"),
        });
    }

    let version = header.schema_version.unwrap_or(0);
    if version == 0 || version > CURRENT_SCHEMA_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: version,
            max_supported: CURRENT_SCHEMA_VERSION,
            path: path.to_path_buf(),
        });
    }

    serde_json::from_slice(bytes).map_err(|source| StoreError::Deserialization {
        path: path.to_path_buf(),
        source,
    })
}
