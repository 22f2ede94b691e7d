use super::feedback::FeedbackAnalyzer;
use super::utils::run_script;
use crate::cache::{BuildCache, CacheStatus};
use crate::command::{self, CompileCommand};
use crate::config::{BuildSettings, ScriptsConfig};
use crate::executor::{ExecutionMode, ExecutionReport, Executor};
use crate::graph::DependencyGraph;
use crate::plan::{self, BuildPlan};
use crate::scan::{self, ScanResult};
use anyhow::{Context, Result};
use colored::*;
use serde_json::json;
use std::fs;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Show stale reasons and every command before it runs
    pub verbose: bool,
    /// Print the commands without running them or touching the cache
    pub dry_run: bool,
    /// Run independent modules of the same dependency wave in parallel
    pub parallel: bool,
}

/// Everything one build invocation knows, owned in one place.
pub struct BuildContext {
    pub settings: BuildSettings,
    pub scan: ScanResult,
    pub graph: DependencyGraph,
    pub order: Vec<String>,
    pub cache: BuildCache,
    pub cache_status: CacheStatus,
}

impl BuildContext {
    /// Scans sources, orders modules and loads the cache.
    ///
    /// Fails on an import cycle, before any command is generated.
    pub fn prepare(settings: &BuildSettings) -> Result<Self> {
        let scan = scan::scan_sources(
            &settings.source_dir,
            &settings.extensions,
            &settings.entry_file,
        );
        let graph = DependencyGraph::from_modules(&scan.modules);
        let order = graph.topological_order()?;
        let (cache, cache_status) = BuildCache::load(&settings.cache_file);

        Ok(Self {
            settings: settings.clone(),
            scan,
            graph,
            order,
            cache,
            cache_status,
        })
    }

    pub fn plan(&self) -> BuildPlan {
        plan::plan_build(
            &self.scan,
            &self.graph,
            &self.order,
            &self.cache,
            &self.settings,
        )
    }

    pub fn commands(&self, plan: &BuildPlan) -> Vec<CompileCommand> {
        command::generate_commands(plan, &self.graph, &self.scan.modules, &self.settings)
    }

    pub fn snapshot(&self) -> BuildCache {
        BuildCache::snapshot(&self.scan, &self.settings)
    }

    fn report_warnings(&self) {
        for warning in &self.scan.warnings {
            println!("{} {}", "!".yellow(), warning);
        }
        if let Some(warning) = self.cache_warning() {
            println!("{} {}", "!".yellow(), warning);
        }
    }

    /// Why the build starts from an empty cache, if it does.
    pub fn cache_warning(&self) -> Option<String> {
        let path = self.settings.display_path(&self.settings.cache_file);
        match &self.cache_status {
            CacheStatus::Loaded => None,
            CacheStatus::Missing => Some(format!(
                "No build cache at {}, rebuilding everything",
                path
            )),
            CacheStatus::Discarded(reason) => Some(format!(
                "Build cache {} is unreadable, rebuilding everything ({})",
                path, reason
            )),
        }
    }

    fn write_compile_database(&self) -> Result<()> {
        let directory = self.settings.root.to_string_lossy().to_string();
        let entries: Vec<serde_json::Value> =
            command::all_compile_commands(&self.order, &self.graph, &self.scan.modules, &self.settings)
                .iter()
                .map(|cmd| {
                    json!({
                        "directory": directory,
                        "command": cmd.to_string(),
                        "file": cmd.source.to_string_lossy(),
                        "output": cmd.output.to_string_lossy(),
                    })
                })
                .collect();

        fs::create_dir_all(&self.settings.out_dir)?;
        let path = self.settings.out_dir.join("compile_commands.json");
        fs::write(&path, serde_json::to_string_pretty(&entries)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum BuildSummary {
    NothingToDo,
    DryRun { commands: Vec<CompileCommand> },
    Succeeded { commands: usize, elapsed: Duration },
    Failed { report: ExecutionReport },
}

impl BuildSummary {
    pub fn is_success(&self) -> bool {
        !matches!(self, BuildSummary::Failed { .. })
    }

    pub fn print(&self) {
        match self {
            BuildSummary::NothingToDo => println!("{} Up to date", "⚡".green()),
            BuildSummary::DryRun { commands } => {
                println!(
                    "{} Dry run: {} command(s) would run",
                    "ℹ".blue(),
                    commands.len()
                );
            }
            BuildSummary::Succeeded { commands, elapsed } => println!(
                "{} Build finished in {:.2?} ({} command(s))",
                "✓".green(),
                elapsed,
                commands
            ),
            BuildSummary::Failed { report } => {
                let failures: Vec<_> = report.failures().collect();
                println!(
                    "{} Build completed with errors ({} of {} command(s) failed):",
                    "x".red(),
                    failures.len(),
                    report.outcomes.len()
                );
                for failure in failures {
                    println!("\n{} {}", "x".red(), failure.label.bold());
                    println!("  {}", failure.rendered.dimmed());
                    println!("{}", failure.output.trim_end());
                    if let Some(hint) = FeedbackAnalyzer::analyze(&failure.output) {
                        println!("\n{} {}", "💡".yellow(), hint);
                    }
                }
            }
        }
    }
}

// --- CORE: Build Project ---
pub fn build_project(
    settings: &BuildSettings,
    scripts: Option<&ScriptsConfig>,
    options: &BuildOptions,
) -> Result<BuildSummary> {
    let start_time = Instant::now();

    // 1. Scan + Order (cycles abort here, before any script or command)
    let mut ctx = BuildContext::prepare(settings)?;

    // 2. Pre-build Script (may generate sources, so rescan after it)
    if !options.dry_run
        && let Some(pre) = scripts.and_then(|s| s.pre_build.as_deref())
    {
        run_script(pre, &settings.root).context("Pre-build script failed")?;
        ctx = BuildContext::prepare(settings)?;
    }
    ctx.report_warnings();

    if ctx.scan.is_empty() {
        anyhow::bail!(
            "No modules or entry file found in {}",
            settings.display_path(&settings.source_dir)
        );
    }

    // 3. Plan
    let plan = ctx.plan();
    if options.verbose {
        for module in &plan.modules {
            match &module.stale {
                Some(reason) => println!("   {} {} ({})", "~".yellow(), module.name, reason),
                None => println!("   {} {}", "=".dimmed(), module.name.dimmed()),
            }
        }
        if let Some(reason) = &plan.link {
            println!("   {} link ({})", "~".yellow(), reason);
        }
    }

    // 4. Commands
    let commands = ctx.commands(&plan);

    if options.dry_run {
        for cmd in &commands {
            println!("{}", cmd);
        }
        let summary = BuildSummary::DryRun { commands };
        summary.print();
        return Ok(summary);
    }

    if let Err(e) = ctx.write_compile_database() {
        println!("{} {:#}", "!".yellow(), e);
    }

    if commands.is_empty() {
        let snapshot = ctx.snapshot();
        if snapshot != ctx.cache {
            save_cache(&snapshot, settings);
        }
        let summary = BuildSummary::NothingToDo;
        summary.print();
        return Ok(summary);
    }

    // 5. Execute
    fs::create_dir_all(&settings.module_dir)
        .with_context(|| format!("Failed to create {}", settings.module_dir.display()))?;
    if let Some(parent) = settings.executable_path().parent() {
        fs::create_dir_all(parent)?;
    }

    let mode = if options.parallel || settings.parallel {
        ExecutionMode::Waves
    } else {
        ExecutionMode::Sequential
    };
    println!(
        "{} Building {} command(s)...",
        "🔨".cyan(),
        commands.len()
    );
    let report = Executor::new(&settings.root)
        .mode(mode)
        .verbose(options.verbose)
        .run(&commands);

    // 6. Cache (only after a clean run)
    if !report.is_success() {
        let summary = BuildSummary::Failed { report };
        summary.print();
        return Ok(summary);
    }
    save_cache(&ctx.snapshot(), settings);

    // 7. Post-build Script
    if let Some(post) = scripts.and_then(|s| s.post_build.as_deref()) {
        run_script(post, &settings.root).context("Post-build script failed")?;
    }

    let summary = BuildSummary::Succeeded {
        commands: commands.len(),
        elapsed: start_time.elapsed(),
    };
    summary.print();
    Ok(summary)
}

fn save_cache(cache: &BuildCache, settings: &BuildSettings) {
    if let Err(e) = cache.save(&settings.cache_file) {
        println!("{} {:#}", "!".yellow(), e);
    }
}
