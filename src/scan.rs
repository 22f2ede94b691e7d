//! Source discovery and module declaration extraction.
//!
//! Declarations are recognized lexically, one per line:
//!
//! ```text
//! export module ui.widget;
//! import ui.event;
//! ```
//!
//! Extraction sits behind [`DeclarationExtractor`] so the regex matcher can be
//! swapped for a real lexer without touching graph or planning code.

use indexmap::IndexMap;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

static MODULE_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*export\s+module\s+([\w.]+)").unwrap());

static IMPORT_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*import\s+([\w.]+)").unwrap());

/// Module identity and imports declared by one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarations {
    pub module: String,
    pub imports: Vec<String>,
}

pub trait DeclarationExtractor {
    /// Returns `None` when `text` declares no module.
    fn extract(&self, text: &str) -> Option<Declarations>;
}

/// Line-anchored regex matcher for `export module` / `import`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexExtractor;

impl DeclarationExtractor for RegexExtractor {
    fn extract(&self, text: &str) -> Option<Declarations> {
        let module = MODULE_DECL.captures(text)?.get(1)?.as_str().to_string();
        let imports = IMPORT_DECL
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect();
        Some(Declarations { module, imports })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub file: PathBuf,
    /// Every declared import, including ones that resolve to no project module.
    pub imports: Vec<String>,
    pub checksum: String,
}

#[derive(Debug, Default)]
pub struct ScanResult {
    /// Modules keyed by name, in discovery order.
    pub modules: IndexMap<String, ModuleInfo>,
    pub entry_checksum: Option<String>,
    pub warnings: Vec<String>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.entry_checksum.is_none()
    }
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Scans `source_dir` with the default [`RegexExtractor`].
pub fn scan_sources(source_dir: &Path, extensions: &[String], entry_file: &Path) -> ScanResult {
    scan_with(&RegexExtractor, source_dir, extensions, entry_file)
}

pub fn scan_with(
    extractor: &dyn DeclarationExtractor,
    source_dir: &Path,
    extensions: &[String],
    entry_file: &Path,
) -> ScanResult {
    let mut result = ScanResult::default();

    if !source_dir.is_dir() {
        result.warnings.push(format!(
            "Source directory '{}' does not exist",
            source_dir.display()
        ));
    } else {
        for entry in WalkDir::new(source_dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    result.warnings.push(format!("Skipping unreadable entry: {}", e));
                    continue;
                }
            };
            // Symlinked sources are read through their link.
            if entry.file_type().is_dir() || !has_extension(entry.path(), extensions) {
                continue;
            }
            scan_file(extractor, entry.path(), entry_file, &mut result);
        }
    }

    // The entry may live outside the scanned extensions; still track it.
    if result.entry_checksum.is_none()
        && let Ok(bytes) = fs::read(entry_file)
    {
        result.entry_checksum = Some(checksum(&bytes));
    }

    result
}

fn scan_file(
    extractor: &dyn DeclarationExtractor,
    path: &Path,
    entry_file: &Path,
    result: &mut ScanResult,
) {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            result
                .warnings
                .push(format!("Could not read {}: {}", path.display(), e));
            return;
        }
    };
    let sum = checksum(&bytes);

    if path == entry_file {
        result.entry_checksum = Some(sum.clone());
    }

    let text = String::from_utf8_lossy(&bytes);
    let Some(decl) = extractor.extract(&text) else {
        return;
    };

    if let Some(existing) = result.modules.get(&decl.module) {
        result.warnings.push(format!(
            "Module '{}' declared in both {} and {}; keeping the first",
            decl.module,
            existing.file.display(),
            path.display()
        ));
        return;
    }

    result.modules.insert(
        decl.module.clone(),
        ModuleInfo {
            name: decl.module,
            file: path.to_path_buf(),
            imports: decl.imports,
            checksum: sum,
        },
    );
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy())
        .is_some_and(|ext| extensions.iter().any(|e| e == ext.as_ref()))
}
