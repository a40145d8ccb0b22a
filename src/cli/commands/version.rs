use anyhow::Result;
use clap::Args;
use std::process::ExitCode;

#[derive(Args)]
pub struct VersionArgs {
    /// Show detailed version information
    #[arg(short, long)]
    pub detailed: bool,
}

pub async fn execute(args: VersionArgs) -> Result<ExitCode> {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    if args.detailed {
        println!("Rust Edition: 2024");
        println!("Target: {}-{}", std::env::consts::ARCH, std::env::consts::OS);
        println!("Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Description: {}", env!("CARGO_PKG_DESCRIPTION"));
    }
    Ok(ExitCode::SUCCESS)
}
