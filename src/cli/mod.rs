//! Command-line interface definitions.

pub mod config;
pub mod output;
pub mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use freightfeed::port::TransportKind;

/// Freightfeed - real-time freight, market and corridor data.
#[derive(Parser, Debug)]
#[command(name = "freightfeed")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to a feed and report updates until Ctrl-C
    Watch(WatchArgs),

    /// Inspect configuration files
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `freightfeed config`
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate a configuration file
    Validate(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "freightfeed.toml")]
    pub config: PathBuf,
}

/// Arguments for the `watch` subcommand.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "freightfeed.toml")]
    pub config: PathBuf,

    /// Override the feed endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Override the transport (sse, websocket, polling)
    #[arg(long)]
    pub transport: Option<TransportKind>,

    /// Override the polling interval in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,
}
