//! Runs generated commands and collects their outcomes.
//!
//! A failed command never stops the run: later commands still execute, even
//! ones that import the module that just failed. Overall success means no
//! command failed.

use crate::command::CompileCommand;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One command at a time, in list order.
    #[default]
    Sequential,
    /// Commands grouped into dependency waves; each wave runs in parallel.
    Waves,
}

#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub label: String,
    pub rendered: String,
    pub success: bool,
    /// Captured stdout followed by stderr.
    pub output: String,
    pub duration: Duration,
}

#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// One outcome per command, in command order.
    pub outcomes: Vec<CommandOutcome>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CommandOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    /// Aggregated error text; empty when every command succeeded.
    pub fn error_report(&self) -> String {
        let mut report = String::new();
        for failure in self.failures() {
            report.push_str(&format!("Command failed: {}\n", failure.rendered));
            report.push_str(&failure.output);
            if !failure.output.ends_with('\n') {
                report.push('\n');
            }
        }
        report
    }
}

pub struct Executor {
    cwd: PathBuf,
    mode: ExecutionMode,
    verbose: bool,
}

impl Executor {
    pub fn new(cwd: &Path) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            mode: ExecutionMode::Sequential,
            verbose: false,
        }
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn run(&self, commands: &[CompileCommand]) -> ExecutionReport {
        if commands.is_empty() {
            return ExecutionReport::default();
        }

        let pb = ProgressBar::new(commands.len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );

        let outcomes: Vec<CommandOutcome> = match self.mode {
            ExecutionMode::Sequential => commands
                .iter()
                .map(|cmd| self.run_tracked(cmd, &pb))
                .collect(),
            ExecutionMode::Waves => {
                let mut slots: Vec<Option<CommandOutcome>> = vec![None; commands.len()];
                for wave in waves(commands) {
                    let results: Vec<(usize, CommandOutcome)> = wave
                        .par_iter()
                        .map(|&i| (i, self.run_tracked(&commands[i], &pb)))
                        .collect();
                    for (i, outcome) in results {
                        slots[i] = Some(outcome);
                    }
                }
                slots.into_iter().flatten().collect()
            }
        };

        pb.finish_and_clear();
        ExecutionReport { outcomes }
    }

    fn run_tracked(&self, cmd: &CompileCommand, pb: &ProgressBar) -> CommandOutcome {
        pb.set_message(format!("Compiling {}", cmd.label()));
        if self.verbose {
            pb.println(format!("   {} {}", "$".dimmed(), cmd));
        }

        let outcome = run_command(cmd, &self.cwd);
        if outcome.success {
            pb.println(format!(
                "   {} {} ({:.2?})",
                "✓".green(),
                outcome.label,
                outcome.duration
            ));
        } else {
            pb.println(format!("   {} {}", "x".red(), outcome.label));
        }
        pb.inc(1);
        outcome
    }
}

/// Spawns `cmd` directly (no shell) and waits for it.
pub fn run_command(cmd: &CompileCommand, cwd: &Path) -> CommandOutcome {
    let start = Instant::now();
    let (success, output) = match cmd.to_command(cwd).output() {
        Ok(out) => {
            let mut text = String::from_utf8_lossy(&out.stdout).to_string();
            text.push_str(&String::from_utf8_lossy(&out.stderr));
            (out.status.success(), text)
        }
        Err(e) => (false, format!("Failed to execute '{}': {}\n", cmd.program, e)),
    };

    CommandOutcome {
        label: cmd.label(),
        rendered: cmd.to_string(),
        success,
        output,
        duration: start.elapsed(),
    }
}

/// Groups command indices so that every command runs in a later wave than
/// the commands producing the modules it waits on. The link waits on every
/// module, so it always lands in the final wave alone.
pub fn waves(commands: &[CompileCommand]) -> Vec<Vec<usize>> {
    let mut produced_in: HashMap<&str, usize> = HashMap::new();
    let mut levels = Vec::with_capacity(commands.len());

    for cmd in commands {
        let level = cmd
            .waits_on
            .iter()
            .filter_map(|dep| produced_in.get(dep.as_str()))
            .map(|l| l + 1)
            .max()
            .unwrap_or(0);
        // A link must follow every compile even when it waits on none of them.
        let level = if cmd.module().is_none() {
            levels.iter().map(|l| l + 1).max().unwrap_or(0).max(level)
        } else {
            level
        };
        if let Some(module) = cmd.module() {
            produced_in.insert(module, level);
        }
        levels.push(level);
    }

    let depth = levels.iter().max().map_or(0, |l| l + 1);
    let mut grouped = vec![Vec::new(); depth];
    for (i, level) in levels.into_iter().enumerate() {
        grouped[level].push(i);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandKind;

    fn cmd(module: Option<&str>, program: &str, args: &[&str], waits_on: &[&str]) -> CompileCommand {
        CompileCommand {
            kind: match module {
                Some(m) => CommandKind::Compile {
                    module: m.to_string(),
                },
                None => CommandKind::Link,
            },
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            source: PathBuf::from("src"),
            output: PathBuf::from("out"),
            waits_on: waits_on.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_waves_respect_dependencies() {
        let commands = vec![
            cmd(Some("a"), "cc", &[], &[]),
            cmd(Some("x"), "cc", &[], &[]),
            cmd(Some("b"), "cc", &[], &["a"]),
            cmd(Some("c"), "cc", &[], &["b", "x"]),
            cmd(None, "cc", &[], &["a", "x", "b", "c"]),
        ];
        assert_eq!(waves(&commands), vec![vec![0, 1], vec![2], vec![3], vec![4]]);
    }

    #[test]
    fn test_waves_ignore_fresh_dependencies() {
        // `b` waits on `a`, but `a` is fresh and has no command.
        let commands = vec![cmd(Some("b"), "cc", &[], &["a"]), cmd(Some("z"), "cc", &[], &[])];
        assert_eq!(waves(&commands), vec![vec![0, 1]]);
    }

    #[test]
    fn test_waves_link_alone_is_last() {
        let commands = vec![cmd(Some("a"), "cc", &[], &[]), cmd(None, "cc", &[], &[])];
        assert_eq!(waves(&commands), vec![vec![0], vec![1]]);
        assert!(waves(&[]).is_empty());
    }

    #[test]
    fn test_missing_program_is_a_failure() {
        let c = cmd(Some("a"), "definitely-not-a-real-compiler-mb", &[], &[]);
        let outcome = run_command(&c, Path::new("."));
        assert!(!outcome.success);
        assert!(outcome.output.contains("Failed to execute"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failures_do_not_stop_later_commands() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("ran");
        let touch = format!("touch '{}'", marker.display());
        let commands = vec![
            cmd(Some("a"), "sh", &["-c", "echo broken >&2; exit 1"], &[]),
            cmd(Some("b"), "sh", &["-c", touch.as_str()], &["a"]),
        ];

        let report = Executor::new(dir.path()).run(&commands);
        assert_eq!(report.outcomes.len(), 2);
        assert!(!report.outcomes[0].success);
        assert!(report.outcomes[0].output.contains("broken"));
        assert!(report.outcomes[1].success);
        assert!(marker.exists());
        assert!(!report.is_success());
        assert!(report.error_report().contains("Command failed: sh -c"));
    }

    #[cfg(unix)]
    #[test]
    fn test_wave_mode_keeps_command_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let commands = vec![
            cmd(Some("a"), "sh", &["-c", "echo a"], &[]),
            cmd(Some("b"), "sh", &["-c", "echo b"], &[]),
            cmd(None, "sh", &["-c", "echo link"], &["a", "b"]),
        ];

        let report = Executor::new(dir.path())
            .mode(ExecutionMode::Waves)
            .run(&commands);
        let labels: Vec<_> = report.outcomes.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "link out"]);
        assert!(report.is_success());
        assert_eq!(report.outcomes[2].output, "link\n");
        assert!(report.error_report().is_empty());
    }

    #[test]
    fn test_empty_run_is_success() {
        let report = Executor::new(Path::new(".")).run(&[]);
        assert!(report.is_success());
        assert!(report.outcomes.is_empty());
    }
}
