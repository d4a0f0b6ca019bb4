use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use syncat::commands::{dupes, sync};
use syncat::config::{Cli, Command, DupesConfig};
use syncat::logging::init_logging;
use syncat::Config;
use tracing::{info, warn};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    info!("syncat v{}", syncat::VERSION);

    match cli.command {
        Command::Sync(args) => {
            // Convert CLI args to Config - this validates immediately
            let config = Config::try_from(args).context("Invalid sync configuration")?;
            let summary = sync::run(&config, cli.quiet).context("Sync aborted")?;
            if summary.is_clean() {
                Ok(ExitCode::SUCCESS)
            } else {
                warn!("Sync finished with errors");
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Dupes(args) => {
            let config = DupesConfig::try_from(args).context("Invalid dupes configuration")?;
            dupes::run(&config).context("Duplicate listing failed")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
