//! Workspace settings: where each snapshot file lives.
//!
//! Stored as a TOML file next to the data so a workspace can be moved
//! wholesale. Every store keeps its own file; the financial snapshot's
//! meta sidecar sits next to it automatically.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths of every snapshot in a data workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub financial_db: PathBuf,
    pub corp_act_db: PathBuf,
    pub listing_db: PathBuf,
    pub links_db: PathBuf,
    pub news_db: PathBuf,
}

impl Settings {
    /// The standard layout rooted at `dir`.
    pub fn default_in(dir: &Path) -> Self {
        Self {
            data_dir: dir.to_path_buf(),
            financial_db: dir.join("financial.csv"),
            corp_act_db: dir.join("corp_actions.csv"),
            listing_db: dir.join("listings.csv"),
            links_db: dir.join("links.csv"),
            news_db: dir.join("news.csv"),
        }
    }

    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("read settings file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("parse settings TOML: {e}"))
    }

    /// Serialize the settings to TOML.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("serialize settings: {e}"))
    }
}
