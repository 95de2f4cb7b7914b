//! Snapshot persistence

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::types::Snapshot;

/// Load a snapshot written by `save`
pub fn load(path: &Path) -> Result<Snapshot> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;

    let snapshot: Snapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;

    debug!(records = snapshot.len(), path = %path.display(), "loaded snapshot");
    Ok(snapshot)
}

/// Replace the snapshot at `path` in one step.
///
/// The JSON is written next to the target and renamed over it, so readers
/// never see a half-written file.
pub fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, json + "\n")
        .with_context(|| format!("Failed to write snapshot: {}", Path::new(&tmp).display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace snapshot: {}", path.display()))?;

    Ok(())
}
