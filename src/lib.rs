//! # Scenario Runner
//!
//! Runs declarative scenarios against a set of bases (network/deployment
//! contexts) in parallel and reports exactly one result per pairing.
//!
//! ## Features
//!
//! - **Flag filtering**: `only` narrows a run globally, `skip` always reports skipped
//! - **Fixed worker pool**: one in-flight item per worker, reassigned on completion
//! - **Crash isolation**: a panicking scenario becomes an error result or aborts the run
//! - **Layered config**: defaults, user, repository, `--config`, environment and CLI flags
//! - **Reports**: styled console output and json documents
//!
//! ## Quick Start
//!
//! ```bash
//! # Show what would run
//! scenario-runner plan
//!
//! # Run against two bases with four workers and a json report
//! scenario-runner run --bases mainnet,goerli -j 4 --format console,json -o report.json
//! ```

pub mod cli;
pub mod config;
pub mod parallel;
pub mod reports;
pub mod scenario;

pub use cli::{Cli, Output};
pub use config::RunnerConfig;

/// Result type alias for scenario runner operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
