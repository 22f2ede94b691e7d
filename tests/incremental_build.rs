//! End-to-end incremental build tests.
//!
//! A fake compiler (a shell script) stands in for clang++: it appends the
//! file name of every `-o` output to `compiler.log`, creates the output, and
//! fails when its input source contains `FAIL_BUILD`.
#![cfg(unix)]

use modbuild::build::{BuildOptions, BuildSummary, build_project};
use modbuild::config::{BuildSettings, ModConfig, ScriptsConfig};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;

const FAKE_COMPILER: &str = r#"#!/bin/sh
log="$(dirname "$0")/compiler.log"
out=""
prev=""
fail=0
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  case "$arg" in
    *.cpp|*.cppm) if grep -q FAIL_BUILD "$arg"; then fail=1; fi ;;
  esac
  prev="$arg"
done
basename "$out" >> "$log"
if [ "$fail" -eq 1 ]; then
  echo "error: forced failure for $out" >&2
  exit 1
fi
mkdir -p "$(dirname "$out")"
touch "$out"
"#;

struct Project {
    dir: TempDir,
    settings: BuildSettings,
    scripts: Option<ScriptsConfig>,
}

impl Project {
    /// a <- b <- c <- main.cpp, with file names that sort differently from build order.
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let tools = dir.path().join("tools");
        fs::create_dir_all(&tools).unwrap();
        let compiler = tools.join("fakecc");
        fs::write(&compiler, FAKE_COMPILER).unwrap();
        fs::set_permissions(&compiler, fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = ModConfig::default();
        config.build.compiler = Some(compiler.to_string_lossy().to_string());
        let settings = BuildSettings::resolve(&config, dir.path(), None);

        let project = Self {
            dir,
            settings,
            scripts: None,
        };
        project.write("src/zmath.cppm", "export module a;\n");
        project.write("src/event.cppm", "export module b;\nimport a;\nimport std;\n");
        project.write("src/widget.cppm", "export module c;\nimport b;\n");
        project.write("src/main.cpp", "import c;\nint main() { return 0; }\n");
        project
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn build_with(&self, options: BuildOptions) -> anyhow::Result<BuildSummary> {
        let _ = fs::remove_file(self.log_path());
        build_project(&self.settings, self.scripts.as_ref(), &options)
    }

    fn build(&self) -> BuildSummary {
        self.build_with(BuildOptions::default()).unwrap()
    }

    fn log_path(&self) -> PathBuf {
        self.dir.path().join("tools").join("compiler.log")
    }

    /// Outputs produced by the last build, in execution order.
    fn compiled(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .map(|log| log.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    fn cache(&self) -> Option<String> {
        fs::read_to_string(&self.settings.cache_file).ok()
    }
}

#[test]
fn test_first_build_compiles_dependencies_first() {
    let project = Project::new();

    let summary = project.build();
    assert!(matches!(summary, BuildSummary::Succeeded { commands: 4, .. }));
    assert_eq!(project.compiled(), vec!["a.pcm", "b.pcm", "c.pcm", "app"]);

    assert!(project.settings.artifact_path("a").exists());
    assert!(project.settings.executable_path().exists());
    assert!(project.cache().is_some());
    assert!(project.settings.out_dir.join("compile_commands.json").exists());
}

#[test]
fn test_second_build_is_up_to_date() {
    let project = Project::new();
    project.build();

    let summary = project.build();
    assert!(matches!(summary, BuildSummary::NothingToDo));
    assert!(project.compiled().is_empty());
}

#[test]
fn test_changed_module_rebuilds_dependents() {
    let project = Project::new();
    project.build();

    project.write("src/zmath.cppm", "export module a;\nint answer();\n");
    project.build();
    assert_eq!(project.compiled(), vec!["a.pcm", "b.pcm", "c.pcm", "app"]);
}

#[test]
fn test_changed_leaf_rebuilds_only_itself() {
    let project = Project::new();
    project.build();

    project.write("src/widget.cppm", "export module c;\nimport b;\nint x;\n");
    project.build();
    assert_eq!(project.compiled(), vec!["c.pcm", "app"]);
}

#[test]
fn test_entry_change_only_relinks() {
    let project = Project::new();
    project.build();

    project.write("src/main.cpp", "import c;\nint main() { return 1; }\n");
    project.build();
    assert_eq!(project.compiled(), vec!["app"]);
}

#[test]
fn test_missing_artifact_is_rebuilt() {
    let project = Project::new();
    project.build();

    fs::remove_file(project.settings.artifact_path("b")).unwrap();
    project.build();
    assert_eq!(project.compiled(), vec!["b.pcm", "c.pcm", "app"]);
}

#[test]
fn test_missing_executable_is_relinked() {
    let project = Project::new();
    project.build();

    fs::remove_file(project.settings.executable_path()).unwrap();
    project.build();
    assert_eq!(project.compiled(), vec!["app"]);
}

#[test]
fn test_corrupt_cache_means_full_rebuild() {
    let project = Project::new();
    project.build();

    fs::write(&project.settings.cache_file, "{ not json").unwrap();
    let summary = project.build();
    assert!(summary.is_success());
    assert_eq!(project.compiled(), vec!["a.pcm", "b.pcm", "c.pcm", "app"]);

    // The rewritten cache is valid again.
    assert!(matches!(project.build(), BuildSummary::NothingToDo));
}

#[test]
fn test_cycle_fails_before_any_command() {
    let project = Project::new();
    project.write("src/zmath.cppm", "export module a;\nimport c;\n");

    let err = project.build_with(BuildOptions::default()).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Import cycle detected"), "{}", message);
    assert!(message.contains("b -> a -> c -> b"), "{}", message);
    assert!(project.compiled().is_empty());
    assert!(project.cache().is_none());
}

#[test]
fn test_failure_keeps_going_and_leaves_cache_untouched() {
    let project = Project::new();
    project.build();
    let cache_before = project.cache();

    project.write("src/event.cppm", "export module b;\nimport a;\n// FAIL_BUILD\n");
    let summary = project.build();

    match &summary {
        BuildSummary::Failed { report } => {
            let failed: Vec<_> = report.failures().map(|f| f.label.as_str()).collect();
            assert_eq!(failed, vec!["b"]);
            assert!(report.error_report().contains("forced failure"));
        }
        other => panic!("expected a failed build, got {:?}", other),
    }
    // Dependents still ran.
    assert_eq!(project.compiled(), vec!["b.pcm", "c.pcm", "app"]);
    assert_eq!(project.cache(), cache_before);

    // Fixing the module rebuilds the same set again.
    project.write("src/event.cppm", "export module b;\nimport a;\n// fixed\n");
    assert!(project.build().is_success());
    assert_eq!(project.compiled(), vec!["b.pcm", "c.pcm", "app"]);
}

#[test]
fn test_dry_run_runs_nothing() {
    let project = Project::new();

    let summary = project
        .build_with(BuildOptions {
            dry_run: true,
            ..Default::default()
        })
        .unwrap();
    match summary {
        BuildSummary::DryRun { commands } => {
            let labels: Vec<_> = commands.iter().map(|c| c.label()).collect();
            assert_eq!(labels, vec!["a", "b", "c", "link app"]);
        }
        other => panic!("expected a dry run, got {:?}", other),
    }
    assert!(project.compiled().is_empty());
    assert!(project.cache().is_none());
}

#[test]
fn test_parallel_build_matches_sequential_result() {
    let project = Project::new();
    project.write("src/extra.cppm", "export module d;\n");

    let summary = project
        .build_with(BuildOptions {
            parallel: true,
            ..Default::default()
        })
        .unwrap();
    assert!(summary.is_success());

    let compiled = project.compiled();
    assert_eq!(compiled.len(), 5);
    assert_eq!(compiled.last().map(String::as_str), Some("app"));
    let pos = |name: &str| compiled.iter().position(|c| c == name).unwrap();
    assert!(pos("a.pcm") < pos("b.pcm"));
    assert!(pos("b.pcm") < pos("c.pcm"));

    assert!(matches!(project.build(), BuildSummary::NothingToDo));
}

#[test]
fn test_failing_post_build_script_fails_build() {
    let mut project = Project::new();
    project.scripts = Some(ScriptsConfig {
        pre_build: None,
        post_build: Some("exit 1".to_string()),
    });

    let err = project.build_with(BuildOptions::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("Post-build script failed"));
}

#[test]
fn test_failing_pre_build_script_aborts() {
    let mut project = Project::new();
    project.scripts = Some(ScriptsConfig {
        pre_build: Some("exit 1".to_string()),
        post_build: None,
    });

    assert!(project.build_with(BuildOptions::default()).is_err());
    assert!(project.compiled().is_empty());
}

#[test]
fn test_unwritable_cache_is_only_a_warning() {
    let mut project = Project::new();
    // A regular file where the cache's parent directory should be.
    project.write("blocker", "not a directory");
    project.settings.cache_file = project.dir.path().join("blocker").join("cache.json");

    let summary = project.build();
    assert!(matches!(summary, BuildSummary::Succeeded { commands: 4, .. }));
    assert!(project.settings.executable_path().exists());
    assert!(project.cache().is_none());
}

#[test]
fn test_cycle_stops_before_pre_build_script() {
    let mut project = Project::new();
    project.scripts = Some(ScriptsConfig {
        pre_build: Some("touch pre-build-ran".to_string()),
        post_build: None,
    });
    project.write("src/zmath.cppm", "export module a;\nimport c;\n");

    assert!(project.build_with(BuildOptions::default()).is_err());
    assert!(!project.dir.path().join("pre-build-ran").exists());
}

#[test]
fn test_pre_build_generated_module_is_built() {
    let mut project = Project::new();
    project.scripts = Some(ScriptsConfig {
        pre_build: Some("printf 'export module gen;\\n' > src/gen.cppm".to_string()),
        post_build: None,
    });

    project.build();
    assert!(project.compiled().contains(&"gen.pcm".to_string()));
}
