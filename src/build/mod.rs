mod clean;
mod core;
mod feedback;
mod utils;
mod watcher;

pub use clean::clean;
pub use core::{BuildContext, BuildOptions, BuildSummary, build_project};
pub use feedback::FeedbackAnalyzer;
pub use utils::{load_config, load_settings, run_script, std_flag};
pub use watcher::watch;
