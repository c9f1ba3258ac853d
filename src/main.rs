use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{LevelFilter, info, warn};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tickloop::GameLoop;
use tickloop::config::Config;

mod cli;
mod demo;

use cli::Cli;
use cli::commands::{Commands, RunArgs};
use demo::{DriftWorld, lock_world};

const DEMO_AGENTS: usize = 8;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tickloop")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("tickloop.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // Records are gated by the global max level, which the config may change later
    env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .parse_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();
    if env::var_os("RUST_LOG").is_none() {
        log::set_max_level(LevelFilter::Info);
    }

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn parse_log_level(level: &str) -> Option<LevelFilter> {
    level.trim().parse().ok()
}

/// Apply the configured log level unless RUST_LOG already set one.
fn apply_log_level(config: &Config) {
    if env::var_os("RUST_LOG").is_some() {
        return;
    }
    let Some(level) = config.log_level.as_deref() else {
        return;
    };
    match parse_log_level(level) {
        Some(filter) => log::set_max_level(filter),
        None => warn!("Ignoring unknown log_level {:?}", level),
    }
}

async fn run_application(cli: &Cli, config: Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None => run_demo(&RunArgs::default(), config).await,
        Some(Commands::Run(args)) => run_demo(args, config).await,
        Some(Commands::Config) => {
            print!("{}", config.to_yaml().context("Failed to render config")?);
            Ok(())
        }
    }
}

/// Fold command-line overrides into the loaded configuration.
fn apply_overrides(args: &RunArgs, mut config: Config) -> Config {
    if let Some(ms) = args.interval_ms {
        config.game_loop.interval_ms = ms;
        config.game_loop.tick_rate_hz = None;
    }
    if let Some(hz) = args.tick_rate {
        config.game_loop.tick_rate_hz = Some(hz);
    }
    if args.recover_panics {
        config.game_loop.recover_panics = true;
    }
    if let Some(ms) = args.duration_ms {
        config.demo.duration_ms = ms;
    }
    if args.pause_after_ms.is_some() {
        config.demo.pause_after_ms = args.pause_after_ms;
    }
    if let Some(ms) = args.pause_for_ms {
        config.demo.pause_for_ms = ms;
    }
    config
}

async fn run_demo(args: &RunArgs, config: Config) -> Result<()> {
    let config = apply_overrides(args, config);
    let demo = &config.demo;

    let world = Arc::new(Mutex::new(DriftWorld::new(DEMO_AGENTS)));
    let shared = world.clone();
    let game_loop = GameLoop::with_config(&config.game_loop, move |delta| {
        lock_world(&shared).advance(delta);
    })
    .context("Failed to create game loop")?;

    println!(
        "{} interval {:?}, running for {}ms",
        "Starting loop:".green(),
        game_loop.interval(),
        demo.duration_ms
    );
    game_loop.start().context("Failed to start game loop")?;

    let total = Duration::from_millis(demo.duration_ms);
    match demo.pause_after_ms.map(Duration::from_millis) {
        Some(pause_after) if pause_after < total => {
            let pause_for = Duration::from_millis(demo.pause_for_ms);
            tokio::time::sleep(pause_after).await;
            game_loop.pause();
            println!("{} for {}ms", "Paused".yellow(), demo.pause_for_ms);
            tokio::time::sleep(pause_for).await;
            game_loop.resume();
            println!("{}", "Resumed".cyan());
            tokio::time::sleep(total.saturating_sub(pause_after + pause_for)).await;
        }
        _ => tokio::time::sleep(total).await,
    }

    game_loop.shutdown().await.context("Game loop terminated abnormally")?;

    let (summary, positions) = {
        let world = lock_world(&world);
        (world.summary(game_loop.state()), world.positions())
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary).context("Failed to encode summary")?);
    } else {
        println!("{} {}", "State:".green(), summary.final_state);
        println!("{} {}", "Ticks:".green(), summary.updates);
        println!("{} {:.3}s", "Simulated:".green(), summary.sim_seconds);
        if let (Some(min), Some(max)) = (summary.min_delta_ms, summary.max_delta_ms) {
            println!("{} min {:.2}ms, max {:.2}ms", "Delta:".green(), min, max);
        }
        let positions: Vec<String> = positions.iter().map(|p| format!("{:.1}", p)).collect();
        println!("{} {}", "Agents:".green(), positions.join(" "));
        if summary.clamped_steps > 0 {
            println!("{} {}", "Clamped steps:".red(), summary.clamped_steps);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    setup_logging().context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_log_level(&config);
    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, config).await.context("Application failed")?;

    Ok(())
}
