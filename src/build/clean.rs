//! Build artifact cleanup.
//!
//! `mb clean` removes the output directory. A module directory or cache file
//! configured outside of it is removed as well.

use crate::config::BuildSettings;
use anyhow::{Context, Result, bail};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

pub fn clean(settings: &BuildSettings) -> Result<()> {
    // Nothing is removed unless every target is safe to remove.
    check_removable("build.out_dir", &settings.out_dir, settings)?;
    check_removable("build.module_dir", &settings.module_dir, settings)?;
    check_removable("build.cache_file", &settings.cache_file, settings)?;

    let mut cleaned = false;

    // 1. Output directory (artifacts, executable, cache, compile_commands.json)
    if settings.out_dir.exists() {
        fs::remove_dir_all(&settings.out_dir).with_context(|| {
            format!(
                "Failed to remove {}",
                settings.display_path(&settings.out_dir)
            )
        })?;
        println!(
            "{} Removed {}",
            "🗑️".red(),
            settings.display_path(&settings.out_dir)
        );
        cleaned = true;
    }

    // 2. Module directory living elsewhere
    if !is_inside(&settings.module_dir, &settings.out_dir) && settings.module_dir.exists() {
        fs::remove_dir_all(&settings.module_dir).with_context(|| {
            format!(
                "Failed to remove {}",
                settings.display_path(&settings.module_dir)
            )
        })?;
        println!(
            "{} Removed {}",
            "🗑️".red(),
            settings.display_path(&settings.module_dir)
        );
        cleaned = true;
    }

    // 3. Cache file living elsewhere
    if !is_inside(&settings.cache_file, &settings.out_dir) && settings.cache_file.exists() {
        fs::remove_file(&settings.cache_file).context("Failed to remove build cache")?;
        cleaned = true;
    }

    if cleaned {
        println!("{} Clean complete.", "✓".green());
    } else {
        println!("{} Nothing to clean", "!".yellow());
    }
    Ok(())
}

/// Refuses targets that are the project root, one of its ancestors, or that
/// hold (or sit inside) the source directory. Sources at the project root
/// only rule out the root itself.
fn check_removable(setting: &str, target: &Path, settings: &BuildSettings) -> Result<()> {
    let target = resolved(target);
    let root = resolved(&settings.root);
    let sources = resolved(&settings.source_dir);

    let inside_sources = sources != root && target.starts_with(&sources);
    if root.starts_with(&target) || sources.starts_with(&target) || inside_sources {
        bail!(
            "Refusing to clean {}: `{}` overlaps the project root or the source directory",
            target.display(),
            setting
        );
    }
    Ok(())
}

/// Canonical form (through the parent for paths not created yet), so `.`,
/// `..` and symlinks compare correctly.
fn resolved(path: &Path) -> PathBuf {
    if let Ok(path) = fs::canonicalize(path) {
        return path;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent)
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

fn is_inside(path: &Path, dir: &Path) -> bool {
    path.starts_with(dir)
}
