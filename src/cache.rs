//! Persisted snapshot of the last successful build.
//!
//! Stored as JSON (default `build/.modbuild-cache.json`):
//!
//! ```json
//! {
//!   "entry_checksum": "9f2c…",
//!   "modules": {
//!     "ui.widget": { "file": "src/ui/widget.cppm", "checksum": "41ab…", "imports": ["ui.event"] }
//!   }
//! }
//! ```
//!
//! A missing or unparsable file is never fatal: the build starts from an
//! empty cache and every module counts as changed.

use crate::config::BuildSettings;
use crate::scan::ScanResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub file: String,
    pub checksum: String,
    #[serde(default)]
    pub imports: Vec<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildCache {
    #[serde(default)]
    pub entry_checksum: Option<String>,
    #[serde(default)]
    pub modules: BTreeMap<String, CacheEntry>,
}

/// How [`BuildCache::load`] got its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Loaded,
    /// No cache yet (first build or after `mb clean`).
    Missing,
    /// The file exists but could not be read or parsed; it was discarded.
    Discarded(String),
}

impl BuildCache {
    pub fn load(path: &Path) -> (Self, CacheStatus) {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return (Self::default(), CacheStatus::Missing);
            }
            Err(e) => return (Self::default(), CacheStatus::Discarded(e.to_string())),
        };

        match serde_json::from_str(&content) {
            Ok(cache) => (cache, CacheStatus::Loaded),
            Err(e) => (Self::default(), CacheStatus::Discarded(e.to_string())),
        }
    }

    /// Snapshot of the current scan, ready to be saved after a successful build.
    pub fn snapshot(scan: &ScanResult, settings: &BuildSettings) -> Self {
        let modules = scan
            .modules
            .values()
            .map(|m| {
                (
                    m.name.clone(),
                    CacheEntry {
                        file: settings.display_path(&m.file).into_owned(),
                        checksum: m.checksum.clone(),
                        imports: m.imports.clone(),
                    },
                )
            })
            .collect();

        Self {
            entry_checksum: scan.entry_checksum.clone(),
            modules,
        }
    }

    /// Overwrites `path` with this snapshot.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write build cache {}", path.display()))?;
        Ok(())
    }

    pub fn checksum_of(&self, module: &str) -> Option<&str> {
        self.modules.get(module).map(|e| e.checksum.as_str())
    }
}
