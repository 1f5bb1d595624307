mod cli;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::{output, Cli, Commands, ConfigCommand};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    // Both reqwest and tokio-tungstenite link rustls; pick the provider once.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Watch(args) => cli::watch::execute(args).await,
        Commands::Config(ConfigCommand::Validate(args)) => {
            cli::config::execute_validate(&args.config)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
