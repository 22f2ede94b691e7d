//! CLI Command handlers
//!
//! Handlers for the subcommands that inspect a project without building it.

pub mod inspect;
