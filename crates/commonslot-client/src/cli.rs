//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// commonslot - Find the meeting slots everyone can make
#[derive(Debug, Parser)]
#[command(name = "commonslot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "COMMONSLOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Find slots common to every identity
    Query(QueryArgs),

    /// Show how identities resolve, without contacting the provider
    Resolve {
        /// Usernames or booking page URLs
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of the `query` command.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Usernames or booking page URLs, one per person
    #[arg(required_unless_present = "request", conflicts_with = "request")]
    pub identities: Vec<String>,

    /// First date, YYYY-MM-DD
    #[arg(long, required_unless_present = "request", conflicts_with = "request")]
    pub start: Option<String>,

    /// Last date (inclusive), YYYY-MM-DD
    #[arg(long, required_unless_present = "request", conflicts_with = "request")]
    pub end: Option<String>,

    /// Meeting length in minutes
    #[arg(long, short, conflicts_with = "request")]
    pub duration: Option<u32>,

    /// Read a JSON request document from this file ("-" for stdin)
    #[arg(long)]
    pub request: Option<PathBuf>,

    /// Print the JSON response instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
