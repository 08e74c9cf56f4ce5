//! CLI module for the rotation engine
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `serve` - Start the engine: scheduler loops plus the admin API
//! - `pools` - Inspect rotation pools seeded from configuration
//! - `jobs` - List reclamation job schedules
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Start with default config
//! rotor serve
//!
//! # Inspect pools from a config file
//! rotor pools list -c rotor.toml
//!
//! # Generate shell completions
//! rotor completions bash > ~/.bash_completion.d/rotor
//! ```

pub mod completions;
pub mod config;
pub mod jobs;
pub mod output;
pub mod pools;
pub mod serve;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Rotor - Lead Distribution & Rotation Engine
#[derive(Parser, Debug)]
#[command(
    name = "rotor",
    version,
    about = "Round-robin lead distribution and reclamation engine"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the engine
    Serve(ServeArgs),
    /// Inspect rotation pools
    #[command(subcommand)]
    Pools(PoolsCommands),
    /// Inspect reclamation jobs
    #[command(subcommand)]
    Jobs(JobsCommands),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "rotor.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "ROTOR_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "ROTOR_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ROTOR_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Start with every job's settings gate closed
    #[arg(long)]
    pub no_jobs: bool,
}

#[derive(Subcommand, Debug)]
pub enum PoolsCommands {
    /// List rotation pools and their members
    List(PoolsListArgs),
}

#[derive(Args, Debug)]
pub struct PoolsListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Filter by lead source
    #[arg(short, long)]
    pub source: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "rotor.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum JobsCommands {
    /// List reclamation jobs and their schedules
    List(JobsListArgs),
}

#[derive(Args, Debug)]
pub struct JobsListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "rotor.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "rotor.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
