//! Mermaid rendering of the module import graph (`mb graph`).

use crate::scan::ModuleInfo;
use indexmap::IndexMap;

/// Mermaid node ids cannot contain dots.
fn node_id(module: &str) -> String {
    module.replace('.', "_")
}

/// `flowchart LR` with one node per module and one edge per declared import.
///
/// Imports of modules outside the project are drawn too; Mermaid creates
/// their nodes implicitly.
pub fn flowchart(modules: &IndexMap<String, ModuleInfo>) -> String {
    let mut out = String::from("flowchart LR\n");
    for name in modules.keys() {
        out.push_str(&format!("    {}[\"{}\"]\n", node_id(name), name));
    }
    for (name, info) in modules {
        for import in &info.imports {
            out.push_str(&format!("    {} --> {}\n", node_id(name), node_id(import)));
        }
    }
    out
}

/// The flowchart inside a fenced block, ready to drop into a Markdown file.
pub fn markdown(modules: &IndexMap<String, ModuleInfo>) -> String {
    format!("# Module diagram\n\n```mermaid\n{}```\n", flowchart(modules))
}
