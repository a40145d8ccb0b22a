use anyhow::Result;
use clap::Args;
use serde_json::json;
use std::process::ExitCode;

use crate::cli::Output;
use crate::config::RunnerConfig;
use crate::parallel::RunPlan;
use crate::scenario::{ScenarioDefinition, WorkKey, load_scenarios};

#[derive(Args, Debug, Default)]
pub struct PlanArgs {
    /// Bases to plan for (comma-separated); every configured base by default
    #[arg(short, long, value_delimiter = ',')]
    pub bases: Vec<String>,

    /// Glob selecting scenario manifests, relative to the scenario root
    #[arg(long)]
    pub glob: Option<String>,

    /// Print the plan as json
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: PlanArgs, custom_config: Option<&str>, output: &Output) -> Result<ExitCode> {
    let overrides = json!({ "scenarios": { "glob": args.glob } });
    let config = RunnerConfig::load(custom_config, Some(overrides))?;
    config.validate()?;

    let bases = config.select_bases(&args.bases)?;
    let scenarios = load_scenarios(&config.scenarios.root, &config.scenarios.glob)?;
    let definitions: Vec<ScenarioDefinition> = scenarios.into_values().collect();
    let plan = RunPlan::build(&bases, &definitions);

    let running: Vec<WorkKey> = plan.running_keys().collect();
    let skipped: Vec<WorkKey> = plan.skipped.iter().map(|item| item.key()).collect();

    if args.json {
        let document = json!({ "running": running, "skipped": skipped });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(ExitCode::SUCCESS);
    }

    output.header("Scenario plan");
    output.table_row("Bases", &bases.len().to_string());
    output.table_row("Scenarios", &definitions.len().to_string());
    output.table_row("Running", &running.len().to_string());
    output.table_row("Skipped", &skipped.len().to_string());

    for key in &running {
        println!("run  {key}");
    }
    for key in &skipped {
        println!("skip {key}");
    }
    Ok(ExitCode::SUCCESS)
}
