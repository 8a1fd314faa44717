use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use theory_explorer_common::{Result, TheoryExplorerError};
use tracing::{debug, info, warn};

use crate::types::Item;

/// Default store file, relative to the working directory
pub const DEFAULT_STORE_FILE: &str = "embeddings.json";

/// On-disk layout: `{ "items": [ {id, text, vector, meta}, ... ] }`
#[derive(Debug, Deserialize)]
struct PersistedStore {
    items: Vec<Item>,
}

#[derive(Serialize)]
struct PersistedStoreRef<'a> {
    items: &'a [Item],
}

/// Write a full snapshot of `items` to `path` atomically.
///
/// Every call writes its own temp file in the target directory and renames it
/// over `path`, so a crash or a concurrent save never leaves a partial store.
pub async fn save_items(path: &Path, items: &[Item]) -> Result<()> {
    let data = serde_json::to_vec_pretty(&PersistedStoreRef { items })
        .map_err(|e| TheoryExplorerError::persistence_write(path, e))?;

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic(&target, &data))
        .await
        .map_err(|e| TheoryExplorerError::persistence_write(path, e))?
        .map_err(|e| {
            warn!("Save to {} failed; previous store left intact", path.display());
            TheoryExplorerError::persistence_write(path, e)
        })?;

    info!("Saved {} items to {}", items.len(), path.display());
    Ok(())
}

fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    // Dropped (and removed) on any early return
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    debug!("Renaming {} over {}", tmp.path().display(), path.display());
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read persisted items. A missing file is `Ok(None)`, not an error.
pub async fn load_items(path: &Path) -> Result<Option<Vec<Item>>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No store file at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(TheoryExplorerError::persistence_read(path, e)),
    };

    let store: PersistedStore =
        serde_json::from_str(&raw).map_err(|e| TheoryExplorerError::persistence_read(path, e))?;

    debug!("Read {} items from {}", store.items.len(), path.display());
    Ok(Some(store.items))
}
