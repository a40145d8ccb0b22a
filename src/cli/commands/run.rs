use anyhow::Result;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::cli::Output;
use crate::config::RunnerConfig;
use crate::parallel::{CrashPolicy, ResultAggregator, RunPlan, ScenarioRunner, WorkerInit};
use crate::reports::{self, ReportFormat};
use crate::scenario::{CommandExecutorFactory, ScenarioDefinition, load_scenarios};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Bases to run against (comma-separated); every configured base by default
    #[arg(short, long, value_delimiter = ',')]
    pub bases: Vec<String>,

    /// Number of worker threads (0 = derive from CPU count)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Report formats (comma-separated)
    #[arg(short, long = "format", value_enum, value_delimiter = ',')]
    pub formats: Vec<ReportFormat>,

    /// Glob selecting scenario manifests, relative to the scenario root
    #[arg(long)]
    pub glob: Option<String>,

    /// What to do when a worker crashes
    #[arg(long, value_enum)]
    pub crash_policy: Option<CrashPolicy>,

    /// Write the json report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    /// Flags mapped onto the config tree; unset ones are pruned before merging
    fn overrides(&self) -> serde_json::Value {
        json!({
            "workers": self.workers,
            "crash_policy": self.crash_policy,
            "scenarios": { "glob": self.glob },
            "report": { "formats": self.formats, "output": self.output },
        })
    }
}

pub async fn execute(args: RunArgs, custom_config: Option<&str>, output: &Output) -> Result<ExitCode> {
    let config = RunnerConfig::load(custom_config, Some(args.overrides()))?;
    config.validate()?;

    let bases = config.select_bases(&args.bases)?;
    let scenarios = load_scenarios(&config.scenarios.root, &config.scenarios.glob)?;
    let definitions: Vec<ScenarioDefinition> = scenarios.values().cloned().collect();
    let plan = RunPlan::build(&bases, &definitions);

    let runner = ScenarioRunner::new(
        CommandExecutorFactory::with_scenarios(scenarios),
        config.worker_count(),
    )
    .with_crash_policy(config.crash_policy);

    output.info(&format!(
        "Running {} of {} items across {} bases ({} skipped, up to {} workers)",
        plan.running.len(),
        plan.total(),
        bases.len(),
        plan.skipped.len(),
        runner.workers()
    ));

    if plan.running.is_empty() {
        output.warning("No runnable scenarios; nothing to run");
    }

    let init = WorkerInit {
        scenario_config: config.scenarios.clone(),
        bases,
        environment: config.environment.clone(),
    };

    let (aggregator, completion) = ResultAggregator::new(&plan);
    // The coordinator blocks on its event channel, so it gets a blocking thread
    let coordinator = tokio::task::spawn_blocking(move || runner.run(plan, init, aggregator));

    let summary = match completion.wait().await {
        Ok(summary) => summary,
        Err(e) => {
            // The coordinator's own error explains why the signal never fired
            coordinator.await??;
            return Err(e);
        }
    };
    let stats = coordinator.await??;
    tracing::debug!(
        "dispatch stats: {} initial, {} reassigned, {} crashed",
        stats.initial,
        stats.reassigned,
        stats.crashed
    );

    reports::emit(&summary, &config.report.formats, config.report.output.as_deref())?;

    if summary.has_failures() {
        output.error(&format!("{} of {} scenarios failed", summary.failed(), summary.results.len()));
        Ok(ExitCode::FAILURE)
    } else {
        output.success("All scenarios passed");
        Ok(ExitCode::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_flags_produce_no_overrides() {
        let pruned = crate::config::overrides::prune_empty(RunArgs::default().overrides());
        assert_eq!(pruned, json!({}));
    }

    #[test]
    fn test_flags_map_onto_config_tree() {
        let args = RunArgs {
            workers: Some(3),
            formats: vec![ReportFormat::Json],
            crash_policy: Some(CrashPolicy::Abort),
            ..RunArgs::default()
        };
        let pruned = crate::config::overrides::prune_empty(args.overrides());
        assert_eq!(
            pruned,
            json!({ "workers": 3, "crash_policy": "abort", "report": { "formats": ["json"] } })
        );
    }
}
