//! Settings loaded from an optional CONL file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "gradebot.conl";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Subject code kept during ingestion and shown in replies
    pub department: String,
    /// CSV export read by `ingest`
    pub csv_path: PathBuf,
    pub snapshot_path: PathBuf,
    /// Directory that receives one chart per answered lookup
    pub chart_dir: PathBuf,
    /// Chat command prefix, only used in the usage hint
    pub command_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            department: "CSCI".to_string(),
            csv_path: PathBuf::from("CSCI_ALL - Sheet1.csv"),
            snapshot_path: PathBuf::from("grades.json"),
            chart_dir: PathBuf::from("charts"),
            command_prefix: "!".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))
            }
        };

        serde_conl::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn to_conl(&self) -> Result<String> {
        serde_conl::to_string(self).context("Failed to serialize config")
    }
}
