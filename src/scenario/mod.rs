//! Scenario data model, manifest loading and the shell-command executor

pub mod command;
pub mod loader;
pub mod result;
pub mod types;

pub use command::{CommandExecutor, CommandExecutorFactory};
pub use loader::load_scenarios;
pub use result::{Diff, ScenarioResult};
pub use types::{BaseConfig, ScenarioDefinition, ScenarioFlag, WorkKey};
