//! CLI module for tickloop - command-line interface and subcommands.
//!
//! Provides the demo runner that drives a game loop, plus config inspection.

pub mod commands;

pub use commands::Cli;
