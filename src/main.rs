use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use scenario_runner::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    cli.run().await
}
