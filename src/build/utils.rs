use crate::config::{BuildSettings, CONFIG_FILE, ModConfig};
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::Path;
use std::process::Command;

// --- Helper: Load Config (mb.toml is optional) ---
pub fn load_config(root: &Path) -> Result<ModConfig> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(ModConfig::default());
    }
    let config_str = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {} - check file permissions", path.display()))?;

    toml::from_str(&config_str).with_context(|| {
        format!(
            "Failed to parse {} - check for syntax errors (missing quotes, brackets)",
            CONFIG_FILE
        )
    })
}

/// Config plus settings resolved against `root` and `$CXX`.
pub fn load_settings(root: &Path) -> Result<(ModConfig, BuildSettings)> {
    let config = load_config(root)?;
    let settings = BuildSettings::resolve(&config, root, std::env::var("CXX").ok());
    Ok((config, settings))
}

/// `-std=` flag for a C++ edition. Named modules need C++20 or later.
pub fn std_flag(edition: &str) -> String {
    let normalized = edition.to_lowercase();
    let edition_clean = normalized.strip_prefix("-std=").unwrap_or(&normalized);

    match edition_clean {
        "c++20" | "c++2a" | "20" => "-std=c++20".to_string(),
        "c++23" | "c++2b" | "23" => "-std=c++23".to_string(),
        "c++26" | "c++2c" | "26" => "-std=c++26".to_string(),
        "gnu++20" | "gnu++2a" => "-std=gnu++20".to_string(),
        "gnu++23" | "gnu++2b" => "-std=gnu++23".to_string(),
        "gnu++26" | "gnu++2c" => "-std=gnu++26".to_string(),

        // Anything else is passed through; the compiler reports what it rejects.
        _ => format!("-std={}", edition_clean),
    }
}

// --- Helper: Run Script (Cross Platform) ---
pub fn run_script(script: &str, project_dir: &Path) -> Result<()> {
    if script.ends_with(".rhai") {
        let script_path = project_dir.join(script);
        if script_path.exists() {
            println!("   {} Running Rhai script: '{}'...", "📜".magenta(), script);
            let engine = rhai::Engine::new();
            engine
                .run_file(script_path)
                .map_err(|e| anyhow::anyhow!("Rhai script failed: {}", e))?;
            return Ok(());
        }
    }

    println!("   {} Running script: '{}'...", "📜".magenta(), script);
    let status = if cfg!(target_os = "windows") {
        Command::new("cmd")
            .args(["/C", script])
            .current_dir(project_dir)
            .status()?
    } else {
        Command::new("sh")
            .args(["-c", script])
            .current_dir(project_dir)
            .status()?
    };

    if !status.success() {
        return Err(anyhow::anyhow!("Script '{}' exited with {}", script, status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_std_flag_module_standards() {
        assert_eq!(std_flag("c++20"), "-std=c++20");
        assert_eq!(std_flag("C++23"), "-std=c++23");
        assert_eq!(std_flag("gnu++20"), "-std=gnu++20");
    }

    #[test]
    fn test_std_flag_aliases() {
        assert_eq!(std_flag("c++2a"), "-std=c++20");
        assert_eq!(std_flag("c++2b"), "-std=c++23");
        assert_eq!(std_flag("20"), "-std=c++20");
    }

    #[test]
    fn test_std_flag_strip_prefix_and_passthrough() {
        assert_eq!(std_flag("-std=c++20"), "-std=c++20");
        assert_eq!(std_flag("c++17"), "-std=c++17");
    }

    #[test]
    fn test_load_config_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.project.name, "app");
        assert!(config.scripts.is_none());
    }

    #[test]
    fn test_load_config_reports_syntax_errors() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[project\nname = 1").unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse mb.toml"));
    }

    #[test]
    fn test_load_config_reads_scripts() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[scripts]\npost_build = \"echo done\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(
            config.scripts.unwrap().post_build.as_deref(),
            Some("echo done")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_script_failure_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(run_script("true", dir.path()).is_ok());
        assert!(run_script("exit 3", dir.path()).is_err());
    }
}
