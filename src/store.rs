//! JSON persistence for [`Index`] snapshots.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::models::Index;

/// Write `index` to `path` as pretty-printed JSON, creating parent
/// directories as needed.
pub fn save_index(index: &Index, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(index).context("Failed to serialize index")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write index: {}", path.display()))?;

    info!(path = %path.display(), pages = index.pages.len(), "saved index");
    Ok(())
}

/// Read a persisted index. A missing file yields `None`; an unreadable or
/// malformed one is logged and also yields `None`.
pub fn load_index(path: &Path) -> Option<Index> {
    if !path.exists() {
        return None;
    }

    let parsed = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|data| serde_json::from_str::<Index>(&data).map_err(anyhow::Error::from));

    match parsed {
        Ok(index) => Some(index),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load index");
            None
        }
    }
}
