//! # modbuild CLI Entry Point
//!
//! This is the main executable for the `mb` command-line tool.
//! It parses CLI arguments using clap and routes commands to the library.
//!
//! ## Commands
//!
//! - **Build**: `build`, `watch`, `clean`
//! - **Inspect**: `plan`, `order`, `graph`
//! - **Shell**: `completions`

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;

use modbuild::build::{self, BuildOptions};
use modbuild::commands::inspect;

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
    fn SetConsoleCP(wCodePageID: u32) -> i32;
}

#[cfg(windows)]
fn enable_windows_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
        SetConsoleCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_windows_utf8_console() {}

#[derive(Parser)]
#[command(name = "mb")]
#[command(about = "Incremental builds for C++20 module projects", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root (directory containing mb.toml)
    #[arg(short = 'C', long = "dir", global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile stale modules and relink the executable
    Build {
        /// Show stale reasons and every command
        #[arg(short, long)]
        verbose: bool,
        /// Show what would be executed without running
        #[arg(long)]
        dry_run: bool,
        /// Compile independent modules in parallel
        #[arg(short, long)]
        parallel: bool,
    },
    /// Show which modules would be rebuilt, and why
    Plan,
    /// Print modules in build order (file -> module)
    Order,
    /// Print the module import graph as a Mermaid flowchart
    Graph {
        /// Write to a file instead of stdout (.md wraps it in a fenced block)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove build outputs and the build cache
    Clean,
    /// Rebuild whenever a source file changes
    Watch {
        /// Show stale reasons and every command
        #[arg(short, long)]
        verbose: bool,
        /// Compile independent modules in parallel
        #[arg(short, long)]
        parallel: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    enable_windows_utf8_console();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Build {
        verbose: false,
        dry_run: false,
        parallel: false,
    });

    if let Commands::Completions { shell } = command {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    let root = cli
        .dir
        .canonicalize()
        .with_context(|| format!("Project directory '{}' not found", cli.dir.display()))?;
    let (config, settings) = build::load_settings(&root)?;
    let scripts = config.scripts.as_ref();

    match command {
        Commands::Build {
            verbose,
            dry_run,
            parallel,
        } => {
            let options = BuildOptions {
                verbose,
                dry_run,
                parallel,
            };
            match build::build_project(&settings, scripts, &options) {
                Ok(summary) if summary.is_success() => Ok(()),
                // Failures were already reported with the summary
                Ok(_) => std::process::exit(1),
                Err(e) => fail(e),
            }
        }
        Commands::Plan => inspect::print_plan(&settings).or_else(fail),
        Commands::Order => inspect::print_order(&settings).or_else(fail),
        Commands::Graph { output } => {
            inspect::print_graph(&settings, output.as_deref()).or_else(fail)
        }
        Commands::Clean => build::clean(&settings),
        Commands::Watch { verbose, parallel } => {
            let options = BuildOptions {
                verbose,
                dry_run: false,
                parallel,
            };
            build::watch(&settings, scripts, &options)
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn fail(e: anyhow::Error) -> Result<()> {
    println!("{} {:#}", "x".red(), e);
    std::process::exit(1);
}
