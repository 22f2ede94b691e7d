//! Read-only views of the project: `mb plan`, `mb order` and `mb graph`.
//!
//! None of these run the compiler or write the cache.

use crate::build::BuildContext;
use crate::config::BuildSettings;
use crate::diagram;
use crate::scan;
use crate::ui::Table;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::Path;

/// `file -> module` for every module, dependencies first.
pub fn order_lines(ctx: &BuildContext) -> Vec<String> {
    ctx.order
        .iter()
        .filter_map(|name| ctx.scan.modules.get(name))
        .map(|info| format!("{} -> {}", ctx.settings.display_path(&info.file), info.name))
        .collect()
}

pub fn print_order(settings: &BuildSettings) -> Result<()> {
    let ctx = BuildContext::prepare(settings)?;
    if ctx.order.is_empty() {
        println!("{} No modules found", "!".yellow());
        return Ok(());
    }
    for line in order_lines(&ctx) {
        println!("{}", line);
    }
    Ok(())
}

pub fn plan_table(ctx: &BuildContext) -> Table {
    let plan = ctx.plan();
    let mut table = Table::new(&["Module", "Source", "Status"]);
    for module in &plan.modules {
        let source = ctx
            .scan
            .modules
            .get(&module.name)
            .map(|info| ctx.settings.display_path(&info.file).to_string())
            .unwrap_or_default();
        let status = match &module.stale {
            Some(reason) => format!("{} {}", "rebuild".yellow(), reason),
            None => "fresh".green().to_string(),
        };
        table.add_row(vec![module.name.bold().to_string(), source, status]);
    }

    let link_status = match &plan.link {
        Some(reason) => format!("{} {}", "relink".yellow(), reason),
        None => "fresh".green().to_string(),
    };
    table.add_row(vec![
        "(link)".dimmed().to_string(),
        ctx.settings.display_path(&ctx.settings.entry_file).to_string(),
        link_status,
    ]);
    table
}

pub fn print_plan(settings: &BuildSettings) -> Result<()> {
    let ctx = BuildContext::prepare(settings)?;
    plan_table(&ctx).print();
    Ok(())
}

/// Drawn from the scan alone: import cycles are shown, not rejected.
pub fn print_graph(settings: &BuildSettings, output: Option<&Path>) -> Result<()> {
    let scan = scan::scan_sources(
        &settings.source_dir,
        &settings.extensions,
        &settings.entry_file,
    );
    for warning in &scan.warnings {
        println!("{} {}", "!".yellow(), warning);
    }
    match output {
        Some(path) => {
            let is_markdown = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
            let content = if is_markdown {
                diagram::markdown(&scan.modules)
            } else {
                diagram::flowchart(&scan.modules)
            };
            fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Module diagram written to {}",
                "✓".green(),
                path.display()
            );
        }
        None => print!("{}", diagram::flowchart(&scan.modules)),
    }
    Ok(())
}
