//! Compiler invocations for a [`BuildPlan`].
//!
//! Commands are structured values (program + argument list) and are spawned
//! directly, never through a shell. Rendering to a single string is only for
//! display and `compile_commands.json`.

use crate::config::BuildSettings;
use crate::graph::DependencyGraph;
use crate::plan::BuildPlan;
use crate::scan::ModuleInfo;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Compile { module: String },
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    pub kind: CommandKind,
    pub program: String,
    pub args: Vec<String>,
    pub source: PathBuf,
    pub output: PathBuf,
    /// Modules whose artifacts this command reads.
    pub waits_on: Vec<String>,
}

impl CompileCommand {
    pub fn label(&self) -> String {
        match &self.kind {
            CommandKind::Compile { module } => module.clone(),
            CommandKind::Link => format!(
                "link {}",
                self.output
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default()
            ),
        }
    }

    pub fn module(&self) -> Option<&str> {
        match &self.kind {
            CommandKind::Compile { module } => Some(module),
            CommandKind::Link => None,
        }
    }

    pub fn to_command(&self, cwd: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(cwd);
        cmd
    }
}

impl fmt::Display for CompileCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
        arg.to_string()
    } else {
        format!("\"{}\"", arg.replace('"', "\\\""))
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn module_binding(name: &str, artifact: &Path) -> String {
    format!("-fmodule-file={}={}", name, artifact.display())
}

/// `--precompile` invocation for one module. `artifacts` must already hold
/// every known import of `info`.
pub fn compile_command(
    info: &ModuleInfo,
    graph: &DependencyGraph,
    artifacts: &HashMap<&str, PathBuf>,
    settings: &BuildSettings,
) -> CompileCommand {
    let output = settings.artifact_path(&info.name);
    let mut args = vec![
        crate::build::std_flag(&settings.std),
        path_arg(&info.file),
        "--precompile".to_string(),
    ];

    let mut waits_on = Vec::new();
    for dep in graph.dependencies(&info.name) {
        if let Some(artifact) = artifacts.get(dep.as_str()) {
            args.push(module_binding(dep, artifact));
            waits_on.push(dep.clone());
        }
    }

    args.extend(settings.flags.iter().cloned());
    args.push("-o".to_string());
    args.push(path_arg(&output));

    CompileCommand {
        kind: CommandKind::Compile {
            module: info.name.clone(),
        },
        program: settings.compiler.clone(),
        args,
        source: info.file.clone(),
        output,
        waits_on,
    }
}

/// Final link of the entry file against every module artifact, in `order`.
pub fn link_command(order: &[String], settings: &BuildSettings) -> CompileCommand {
    let mut args = vec![
        crate::build::std_flag(&settings.std),
        path_arg(&settings.entry_file),
    ];

    for name in order {
        args.push(module_binding(name, &settings.artifact_path(name)));
    }
    for name in order {
        args.push(path_arg(&settings.artifact_path(name)));
    }

    args.extend(settings.flags.iter().cloned());
    args.extend(settings.libs.iter().map(|lib| format!("-l{}", lib)));
    args.push("-o".to_string());
    args.push(path_arg(settings.executable_path()));

    CompileCommand {
        kind: CommandKind::Link,
        program: settings.compiler.clone(),
        args,
        source: settings.entry_file.clone(),
        output: settings.executable.clone(),
        waits_on: order.to_vec(),
    }
}

/// Commands for every stale module in plan order, then the link if it is stale.
///
/// Empty when the plan is up to date.
pub fn generate_commands(
    plan: &BuildPlan,
    graph: &DependencyGraph,
    modules: &IndexMap<String, ModuleInfo>,
    settings: &BuildSettings,
) -> Vec<CompileCommand> {
    let mut commands = Vec::new();
    let mut artifacts: HashMap<&str, PathBuf> = HashMap::new();

    for planned in &plan.modules {
        let Some(info) = modules.get(&planned.name) else {
            continue;
        };
        if planned.is_stale() {
            commands.push(compile_command(info, graph, &artifacts, settings));
        }
        // Rebuilt or cached, the artifact lives at the same deterministic path.
        artifacts.insert(planned.name.as_str(), settings.artifact_path(&planned.name));
    }

    if plan.needs_link() {
        let order: Vec<String> = plan.modules.iter().map(|m| m.name.clone()).collect();
        commands.push(link_command(&order, settings));
    }

    commands
}

/// One compile command per module regardless of staleness, for IDE tooling.
pub fn all_compile_commands(
    order: &[String],
    graph: &DependencyGraph,
    modules: &IndexMap<String, ModuleInfo>,
    settings: &BuildSettings,
) -> Vec<CompileCommand> {
    let mut artifacts: HashMap<&str, PathBuf> = HashMap::new();
    let mut commands = Vec::new();
    for name in order {
        if let Some(info) = modules.get(name) {
            commands.push(compile_command(info, graph, &artifacts, settings));
            artifacts.insert(name.as_str(), settings.artifact_path(name));
        }
    }
    commands
}
