//! Configuration management for the scenario runner
//!
//! Settings are layered with figment (see [`LayeredConfig`]) and then
//! extracted into the typed [`RunnerConfig`] that the commands consume.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use crate::parallel::{CrashPolicy, calculate_optimal_workers};
use crate::reports::ReportFormat;
use crate::scenario::BaseConfig;

pub mod core;
pub mod overrides;
pub mod smart_load;

pub use self::core::LayeredConfig;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Worker threads to spawn; 0 derives the count from the CPU
    pub workers: usize,

    /// Share of the available cores used when `workers` is 0
    pub thread_percentage: u8,

    pub crash_policy: CrashPolicy,

    pub scenarios: ScenarioRunConfig,

    pub report: ReportConfig,

    /// Every base a run may target
    pub bases: Vec<BaseConfig>,

    pub environment: EnvironmentConfig,
}

/// Where scenario manifests live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioRunConfig {
    pub root: PathBuf,
    /// Glob matched against paths relative to `root`
    pub glob: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub formats: Vec<ReportFormat>,
    /// File the json report is written to instead of stdout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

/// Extra environment handed to every scenario command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub vars: BTreeMap<String, String>,
    /// Positional arguments appended after the command
    pub args: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            thread_percentage: 75,
            crash_policy: CrashPolicy::Error,
            scenarios: ScenarioRunConfig::default(),
            report: ReportConfig::default(),
            bases: Vec::new(),
            environment: EnvironmentConfig::default(),
        }
    }
}

impl Default for ScenarioRunConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("scenario"),
            glob: "**/*.{toml,yaml,yml,json}".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            formats: vec![ReportFormat::Console],
            output: None,
        }
    }
}

impl RunnerConfig {
    /// Load the layered configuration and extract the typed view
    pub fn load(custom_config: Option<&str>, overrides: Option<serde_json::Value>) -> Result<Self> {
        LayeredConfig::load(custom_config, overrides)?.extract()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.bases.is_empty() {
            bail!("At least one base must be configured");
        }

        let mut seen = HashSet::new();
        for base in &self.bases {
            if base.name.trim().is_empty() {
                bail!("Base names cannot be empty");
            }
            if !seen.insert(base.name.as_str()) {
                bail!("Duplicate base name: {}", base.name);
            }
        }

        if !(1..=100).contains(&self.thread_percentage) {
            bail!(
                "thread_percentage must be between 1 and 100, got {}",
                self.thread_percentage
            );
        }

        if self.scenarios.glob.trim().is_empty() {
            bail!("scenarios.glob cannot be empty");
        }

        if self.report.formats.is_empty() {
            bail!("At least one report format must be specified");
        }

        Ok(())
    }

    /// Pick bases by name in the requested order; an empty selection means all
    pub fn select_bases(&self, names: &[String]) -> Result<Vec<BaseConfig>> {
        if names.is_empty() {
            return Ok(self.bases.clone());
        }

        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let Some(base) = self.bases.iter().find(|base| &base.name == name) else {
                let known: Vec<&str> = self.bases.iter().map(|base| base.name.as_str()).collect();
                bail!("Unknown base '{name}' (configured: {})", known.join(", "));
            };
            if selected.iter().any(|chosen: &BaseConfig| chosen.name == base.name) {
                continue;
            }
            selected.push(base.clone());
        }
        Ok(selected)
    }

    pub fn worker_count(&self) -> usize {
        calculate_optimal_workers(self.workers, self.thread_percentage)
    }
}

#[cfg(test)]
mod tests;
