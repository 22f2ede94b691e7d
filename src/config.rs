//! Project configuration (`mb.toml`).
//!
//! Every key is optional; a project without `mb.toml` builds `src/main.cpp`
//! plus every module under `src/` into `build/app` with `clang++ -std=c++20`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "mb.toml";

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ModConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub build: BuildConfig,
    pub scripts: Option<ScriptsConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProjectConfig {
    /// Name of the linked executable.
    #[serde(default = "default_name")]
    pub name: String,
    /// Entry file, relative to the source directory.
    #[serde(default = "default_entry")]
    pub entry: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            entry: default_entry(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct BuildConfig {
    pub compiler: Option<String>,
    #[serde(default = "default_std")]
    pub std: String,
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
    /// Defaults to `<out_dir>/modules`.
    pub module_dir: Option<String>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub libs: Vec<String>,
    #[serde(default)]
    pub parallel: bool,
    /// Defaults to `<out_dir>/.modbuild-cache.json`.
    pub cache_file: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            compiler: None,
            std: default_std(),
            source_dir: default_source_dir(),
            out_dir: default_out_dir(),
            module_dir: None,
            extensions: default_extensions(),
            flags: Vec::new(),
            libs: Vec::new(),
            parallel: false,
            cache_file: None,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ScriptsConfig {
    pub pre_build: Option<String>,
    pub post_build: Option<String>,
}

fn default_name() -> String {
    "app".to_string()
}

fn default_entry() -> String {
    "main.cpp".to_string()
}

fn default_std() -> String {
    "c++20".to_string()
}

fn default_source_dir() -> String {
    "src".to_string()
}

fn default_out_dir() -> String {
    "build".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["cpp".to_string(), "cppm".to_string()]
}

/// Fully resolved settings for one build, all paths anchored at the project root.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub out_dir: PathBuf,
    pub module_dir: PathBuf,
    pub entry_file: PathBuf,
    pub executable: PathBuf,
    pub cache_file: PathBuf,
    pub compiler: String,
    pub std: String,
    pub extensions: Vec<String>,
    pub flags: Vec<String>,
    pub libs: Vec<String>,
    pub parallel: bool,
}

impl BuildSettings {
    /// Resolves `config` against `root`. `compiler_env` is the value of `$CXX`, if any.
    pub fn resolve(config: &ModConfig, root: &Path, compiler_env: Option<String>) -> Self {
        let build = &config.build;
        let source_dir = root.join(&build.source_dir);
        let out_dir = root.join(&build.out_dir);
        let module_dir = match &build.module_dir {
            Some(dir) => root.join(dir),
            None => out_dir.join("modules"),
        };
        let cache_file = match &build.cache_file {
            Some(file) => root.join(file),
            None => out_dir.join(".modbuild-cache.json"),
        };

        let exe_name = if cfg!(target_os = "windows") {
            format!("{}.exe", config.project.name)
        } else {
            config.project.name.clone()
        };

        let compiler = build
            .compiler
            .clone()
            .or(compiler_env.filter(|c| !c.trim().is_empty()))
            .unwrap_or_else(|| "clang++".to_string());

        Self {
            root: root.to_path_buf(),
            entry_file: source_dir.join(&config.project.entry),
            executable: out_dir.join(exe_name),
            source_dir,
            out_dir,
            module_dir,
            cache_file,
            compiler,
            std: build.std.clone(),
            extensions: build.extensions.clone(),
            flags: build.flags.clone(),
            libs: build.libs.clone(),
            parallel: build.parallel,
        }
    }

    /// Precompiled module artifact for `module`.
    pub fn artifact_path(&self, module: &str) -> PathBuf {
        self.module_dir.join(format!("{}.pcm", module))
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable
    }

    /// Path shown to the user and stored in the cache: relative to the root when possible.
    pub fn display_path<'a>(&self, path: &'a Path) -> std::borrow::Cow<'a, str> {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
    }
}
