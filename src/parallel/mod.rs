//! Parallel scenario dispatch
//!
//! This module owns everything between "here are the bases and scenarios" and
//! "here is one result per pairing".
//!
//! # Architecture Responsibilities
//!
//! ## What This Module Does:
//! - **Expansion**: pairs every base with every scenario ([`plan::expand`])
//! - **Filtering**: applies `only`/`skip` flags globally ([`plan::filter_running`])
//! - **Dispatch**: feeds a fixed pool of worker threads one item at a time ([`Dispatcher`])
//! - **Aggregation**: tracks the pending set and signals completion once ([`ResultAggregator`])
//!
//! ## What This Module Does NOT Do:
//! - **Scenario semantics**: bodies run behind [`ScenarioExecutor`]
//! - **Discovery**: scenarios arrive already loaded
//! - **Reporting**: the [`RunSummary`] is handed to `reports`
//!
//! # Message Flow
//!
//! ```text
//! ┌──────────────┐  Assignment   ┌──────────────┐
//! │ Coordinator  │──────────────▶│   Worker N   │
//! │ (Dispatcher, │               │ (executor,   │
//! │  Aggregator) │◀──────────────│  one item)   │
//! └──────────────┘ WorkerMessage └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use scenario_runner::parallel::{
//!     ExecutorFactory, RunPlan, ScenarioExecutor, ScenarioOutcome, ScenarioRunner, WorkerInit,
//! };
//! use scenario_runner::scenario::{BaseConfig, ScenarioDefinition, ScenarioFlag};
//!
//! struct AlwaysPasses;
//!
//! impl ScenarioExecutor for AlwaysPasses {
//!     fn execute(&mut self, _base: &BaseConfig, _scenario: &str) -> ScenarioOutcome {
//!         ScenarioOutcome::success()
//!     }
//! }
//!
//! struct Factory;
//!
//! impl ExecutorFactory for Factory {
//!     type Executor = AlwaysPasses;
//!
//!     fn create(&self, _init: &WorkerInit) -> anyhow::Result<AlwaysPasses> {
//!         Ok(AlwaysPasses)
//!     }
//! }
//!
//! let bases = vec![BaseConfig::new("mainnet", "mainnet", "usdc")];
//! let scenarios = vec![
//!     ScenarioDefinition::new("supply"),
//!     ScenarioDefinition::new("absorb").with_flag(ScenarioFlag::Skip),
//! ];
//! let plan = RunPlan::build(&bases, &scenarios);
//! let init = WorkerInit { bases, ..WorkerInit::default() };
//!
//! let (summary, _stats) = ScenarioRunner::new(Factory, 2).run_to_completion(plan, init)?;
//! assert_eq!(summary.passed(), 1);
//! assert_eq!(summary.skipped(), 1);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod core;
pub mod plan;
pub mod source;
pub mod tracker;
pub mod worker;

// Re-export main types for easier access
pub use self::core::{CrashPolicy, DispatchStats, Dispatcher, ScenarioRunner, calculate_optimal_workers};
pub use plan::{RunPlan, WorkItem, expand, filter_running};
pub use source::WorkSource;
pub use tracker::{Completion, ResultAggregator, RunPhase, RunSummary};
pub use worker::{
    Assignment, ExecutorFactory, ScenarioExecutor, ScenarioOutcome, WorkerHandle, WorkerInit,
    WorkerMessage,
};
