//! Store saving.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use super::StoreFile;
use crate::error::{Result, StoreError};

/// Writes `store` to `path` as pretty-printed JSON.
///
/// Writes a temp file next to the target and renames it into place, so an
/// interrupted save never leaves a truncated store behind.
pub fn save_store(store: &mut StoreFile, path: &Path) -> Result<()> {
    store.touch();

    let mut bytes =
        serde_json::to_vec_pretty(store).map_err(|source| StoreError::Serialization { source })?;
    bytes.push(b'\n');

    let temp_path = path.with_extension("json.tmp");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut file = File::create(&temp_path).map_err(|e| StoreError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(&bytes).map_err(|e| StoreError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;

    file.sync_all().map_err(|e| StoreError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| StoreError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "saved store");
    Ok(())
}
