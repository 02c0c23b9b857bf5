//! Universe configuration — sector-organized symbol lists.
//!
//! The universe is stored as a TOML config file with industry sectors
//! and their member RICs. Refresh and news runs iterate it to decide
//! which symbols and keywords to pull.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The complete universe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Universe {
    pub sectors: BTreeMap<String, Vec<String>>,
}

impl Universe {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("read universe file: {e}"))?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("parse universe TOML: {e}"))
    }

    /// Get all symbols across all sectors.
    pub fn all_symbols(&self) -> Vec<&str> {
        self.sectors
            .values()
            .flat_map(|symbols| symbols.iter().map(|s| s.as_str()))
            .collect()
    }

    /// Get symbols for a specific sector.
    pub fn sector_symbols(&self, sector: &str) -> Option<&[String]> {
        self.sectors.get(sector).map(|v| v.as_slice())
    }

    /// Get the list of sector names.
    pub fn sector_names(&self) -> Vec<&str> {
        self.sectors.keys().map(|s| s.as_str()).collect()
    }

    /// Total number of symbols.
    pub fn symbol_count(&self) -> usize {
        self.sectors.values().map(|v| v.len()).sum()
    }

    /// Create a default Bursa Malaysia universe with major sectors.
    pub fn default_bursa() -> Self {
        let mut sectors = BTreeMap::new();

        sectors.insert(
            "Banking".into(),
            vec![
                "MBBM.KL", "PUBM.KL", "CIMB.KL", "RHBC.KL", "HLBB.KL", "AMMB.KL", "BIMB.KL",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );

        sectors.insert(
            "Plantation".into(),
            vec!["SIPL.KL", "KLKK.KL", "IOIB.KL", "GENP.KL", "UTPS.KL"]
                .into_iter()
                .map(String::from)
                .collect(),
        );

        sectors.insert(
            "Telecom".into(),
            vec!["MXSC.KL", "CMMB.KL", "AXIA.KL", "TLMM.KL"]
                .into_iter()
                .map(String::from)
                .collect(),
        );

        Self { sectors }
    }

    /// Serialize the universe to TOML.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("serialize universe: {e}"))
    }
}
