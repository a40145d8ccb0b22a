//! Command-line interface for the scenario runner
//!
//! Argument parsing lives in [`commands`]; [`Output`] handles user-facing
//! status lines so stdout stays free for reports.

pub mod commands;
pub mod output;

pub use commands::Cli;
pub use output::Output;
