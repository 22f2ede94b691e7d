//! # modbuild - Incremental builds for C++20 module projects
//!
//! modbuild (`mb`) compiles a project whose sources declare named modules
//! with `export module` / `import`. It derives the module dependency graph
//! from the source text itself, so there is no build script to maintain.
//!
//! ## Features
//!
//! - **Zero Configuration**: `src/main.cpp` plus every module under `src/` builds into `build/app`
//! - **Incremental**: only modules whose source (or an import's source) changed are recompiled
//! - **Cycle Detection**: import cycles are reported with the full cycle path before anything runs
//! - **Parallel Waves**: independent modules can compile concurrently
//!
//! ## Quick Start
//!
//! ```bash
//! # Build (incrementally)
//! mb build
//!
//! # What would be rebuilt, and why
//! mb plan
//! ```
//!
//! ## Module Organization
//!
//! - [`scan`] - Source discovery and declaration extraction
//! - [`graph`] - Module dependency graph and topological order
//! - [`cache`] - Persisted checksums of the last successful build
//! - [`plan`] - Stale-set computation
//! - [`command`] - Compiler invocations
//! - [`executor`] - Command execution and error collection
//! - [`build`] - The build pipeline tying it all together

/// Build pipeline, cleanup and watch mode.
pub mod build;

/// Build cache (`.modbuild-cache.json`).
pub mod cache;

/// Compile and link command generation.
pub mod command;

/// CLI command handlers extracted from main.
pub mod commands;

/// Configuration file parsing (`mb.toml`).
pub mod config;

/// Mermaid module diagrams.
pub mod diagram;

/// Command execution.
pub mod executor;

/// Module dependency graph.
pub mod graph;

/// Incremental build planning.
pub mod plan;

/// Source scanning.
pub mod scan;

/// Terminal UI utilities (tables).
pub mod ui;
