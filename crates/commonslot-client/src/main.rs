//! commonslot CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use commonslot_client::cli::{Cli, Command, ConfigAction};
use commonslot_client::commands;
use commonslot_client::config::ClientConfig;
use commonslot_client::error::ClientResult;
use commonslot_core::{TracingConfig, init_tracing};
use commonslot_server::AvailabilityHandler;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(TracingConfig::cli(cli.debug)) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };
    tracing::debug!(
        access = config.calendly.access.as_str(),
        strategy = config.calendly.strategy.as_str(),
        "configuration loaded"
    );

    match cli.command {
        Command::Query(args) => {
            let handler = AvailabilityHandler::new(config.build_provider()?, config.engine_config()?);
            let (output, result) = commands::query::run(&handler, &args).await;
            if !output.is_empty() {
                println!("{}", output);
            }
            result
        }
        Command::Resolve { inputs } => {
            let resolver = config.engine_config()?.resolver();
            println!("{}", commands::resolve::run(&resolver, &inputs)?);
            Ok(())
        }
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(),
        },
    }
}
