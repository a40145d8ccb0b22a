use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use std::process::ExitCode;

use crate::cli::Output;
use crate::config::{LayeredConfig, RunnerConfig};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format: toml, json, yaml
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
    /// Print a single configuration key or section
    Get { key: String },
    /// Validate the merged configuration
    Validate,
}

pub async fn execute(args: ConfigArgs, custom_config: Option<&str>, output: &Output) -> Result<ExitCode> {
    match args.command {
        ConfigCommand::Show { format } => {
            let config = RunnerConfig::load(custom_config, None)?;
            println!("{}", render(&config, &format)?);
        }
        ConfigCommand::Get { key } => {
            let layered = LayeredConfig::load(custom_config, None)?;
            let value: serde_json::Value = layered.get_section(&key)?;
            match value {
                serde_json::Value::String(s) => println!("{s}"),
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    println!("{}", serde_json::to_string_pretty(&value)?)
                }
                other => println!("{other}"),
            }
        }
        ConfigCommand::Validate => {
            let config = RunnerConfig::load(custom_config, None)?;
            config.validate()?;

            output.success("Configuration is valid");
            let names: Vec<&str> = config.bases.iter().map(|base| base.name.as_str()).collect();
            output.table_row("Bases", &names.join(", "));
            output.table_row("Workers", &config.worker_count().to_string());
            output.table_row("Scenario root", &config.scenarios.root.display().to_string());
            output.table_row("Scenario glob", &config.scenarios.glob);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn render(config: &RunnerConfig, format: &str) -> Result<String> {
    let rendered = match format.to_lowercase().as_str() {
        "toml" => toml::to_string_pretty(config)?,
        "json" => serde_json::to_string_pretty(config)?,
        "yaml" | "yml" => serde_yml::to_string(config)?,
        _ => bail!("Unsupported format: {format}. Use toml, json, or yaml"),
    };
    Ok(rendered)
}
