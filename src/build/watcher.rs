use super::core::{BuildOptions, build_project};
use crate::config::{BuildSettings, ScriptsConfig};
use anyhow::Result;
use colored::*;
use notify::{Config, RecursiveMode, Watcher};
use std::sync::mpsc::channel;
use std::time::Duration;

pub fn watch(
    settings: &BuildSettings,
    scripts: Option<&ScriptsConfig>,
    options: &BuildOptions,
) -> Result<()> {
    println!(
        "{} Watching for changes in {}...",
        "👀".cyan(),
        settings.display_path(&settings.source_dir)
    );

    let (tx, rx) = channel();
    let config_notify = Config::default().with_poll_interval(Duration::from_secs(1));
    let mut watcher = notify::RecommendedWatcher::new(tx, config_notify)?;
    watcher.watch(&settings.source_dir, RecursiveMode::Recursive)?;

    // First run
    rebuild(settings, scripts, options);

    while rx.recv().is_ok() {
        // Debounce simple
        std::thread::sleep(Duration::from_millis(100));
        while rx.try_recv().is_ok() {}

        print!("\x1B[2J\x1B[1;1H");
        println!("{} File changed. Rebuilding...", "🔄".yellow());
        rebuild(settings, scripts, options);
    }
    Ok(())
}

// A failed build (or a cycle) must not end the watch loop.
fn rebuild(settings: &BuildSettings, scripts: Option<&ScriptsConfig>, options: &BuildOptions) {
    if let Err(e) = build_project(settings, scripts, options) {
        println!("{} Error: {:#}", "x".red(), e);
    }
}
