//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: drive the demo world with a game loop
//! - config: print the effective configuration

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// tickloop - fixed-timestep game loop demo runner
#[derive(Parser, Debug)]
#[command(name = "tickloop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the demo world on a game loop
    Run(RunArgs),

    /// Print the effective configuration as YAML
    Config,
}

/// Overrides for the demo run; unset values come from the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Milliseconds between ticks (fractions allowed)
    #[arg(short, long)]
    pub interval_ms: Option<f64>,

    /// Ticks per second (overrides --interval-ms)
    #[arg(short = 'r', long, conflicts_with = "interval_ms")]
    pub tick_rate: Option<f64>,

    /// Total run time in milliseconds
    #[arg(short, long)]
    pub duration_ms: Option<u64>,

    /// Pause the loop this many milliseconds after start
    #[arg(long)]
    pub pause_after_ms: Option<u64>,

    /// How long to stay paused, in milliseconds
    #[arg(long, requires = "pause_after_ms")]
    pub pause_for_ms: Option<u64>,

    /// Keep ticking when the update callback panics
    #[arg(long)]
    pub recover_panics: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}
