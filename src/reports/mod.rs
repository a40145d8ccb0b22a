//! Run reporting
//!
//! Turns a [`RunSummary`] into console or json output with pluggable generators.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;
use uuid::Uuid;

use crate::parallel::RunSummary;
use crate::scenario::ScenarioResult;

mod console;
mod json;

pub use console::ConsoleReport;
pub use json::JsonReport;

/// Core reporting trait - allows pluggable report formats
pub trait ReportGenerator {
    /// Generate report content as a string
    fn generate(&self, summary: &RunSummary, metadata: &ReportMetadata) -> Result<String>;
}

/// Report format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Console,
    Json,
}

impl ReportFormat {
    pub fn generator(&self) -> Box<dyn ReportGenerator> {
        match self {
            ReportFormat::Console => Box::new(ConsoleReport),
            ReportFormat::Json => Box::new(JsonReport),
        }
    }
}

/// Metadata about one run, shared by every format
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    pub run_id: Uuid,
    pub generated_at: SystemTime,
    pub version: &'static str,
}

impl ReportMetadata {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: SystemTime::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl Default for ReportMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Render every requested format; json goes to `output` when one is set
pub fn emit(summary: &RunSummary, formats: &[ReportFormat], output: Option<&Path>) -> Result<()> {
    let metadata = ReportMetadata::new();

    for format in formats {
        let content = format.generator().generate(summary, &metadata)?;
        match (format, output) {
            (ReportFormat::Json, Some(path)) => {
                std::fs::write(path, &content)
                    .with_context(|| format!("Failed to write report: {}", path.display()))?;
                tracing::info!("json report written to {}", path.display());
            }
            _ => println!("{content}"),
        }
    }
    Ok(())
}

/// Results ordered by base, then scenario
pub(crate) fn sorted_results(summary: &RunSummary) -> Vec<&ScenarioResult> {
    let mut results: Vec<&ScenarioResult> = summary.results.iter().collect();
    results.sort_by(|a, b| (&a.base, &a.scenario).cmp(&(&b.base, &b.scenario)));
    results
}
