//! Wave simulation development tools.
//!
//! ```bash
//! # Check a config (or every .ron file in a directory)
//! cargo run -p wave_tools -- validate assets/data/waves.ron
//!
//! # Run a config headless, one JSON object per line on stdout
//! cargo run -p wave_tools -- simulate assets/data/waves.ron --ticks 2000 --json
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

use wave_core::math::Fixed;
use wave_tools::runner::{run, RunOptions, RunSummary};
use wave_tools::validate::{load_config, validate_path, ToolResult};

#[derive(Parser)]
#[command(name = "wave-tools")]
#[command(about = "Development tools for the wave simulation")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate config files
    Validate {
        /// Config file or directory of .ron files
        #[arg(default_value = "assets/data/waves.ron")]
        path: PathBuf,
    },

    /// Run a config headless
    Simulate {
        /// Config file
        #[arg(default_value = "assets/data/waves.ron")]
        path: PathBuf,

        /// Ticks to run after the first wave spawns
        #[arg(short, long, default_value = "1200")]
        ticks: u64,

        /// Override the config seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Hostile walking speed in units per tick
        #[arg(long, default_value = "0.5")]
        speed: f64,

        /// Print events and the summary as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    let result = match cli.command {
        Commands::Validate { path } => cmd_validate(&path),
        Commands::Simulate {
            path,
            ticks,
            seed,
            speed,
            json,
        } => cmd_simulate(&path, ticks, seed, speed, json),
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn cmd_validate(path: &Path) -> ToolResult<()> {
    tracing::info!("Validating config: {}", path.display());
    let reports = validate_path(path)?;

    let failed: Vec<_> = reports.iter().filter(|r| !r.is_clean()).collect();
    for report in &failed {
        for issue in &report.issues {
            tracing::error!("{}: {issue}", report.path.display());
        }
    }

    if failed.is_empty() {
        tracing::info!("Validation passed ({} file(s))", reports.len());
        Ok(())
    } else {
        tracing::error!("{} of {} file(s) failed validation", failed.len(), reports.len());
        std::process::exit(1);
    }
}

fn cmd_simulate(path: &Path, ticks: u64, seed: Option<u64>, speed: f64, json: bool) -> ToolResult<()> {
    let config = load_config(path)?;
    let options = RunOptions {
        ticks,
        seed,
        speed: Fixed::saturating_from_num(speed),
    };
    let summary = run(config, &options)?;

    if json {
        for event in &summary.events {
            println!("{}", serde_json::to_string(event)?);
        }
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    for timed in &summary.events {
        println!("[{:>6}] {:?}", timed.tick, timed.event);
    }
    println!("Run complete:");
    println!("  Seed: {}", summary.seed);
    println!("  Ticks: {}", summary.ticks);
    println!("  Wave reached: {}", summary.final_wave);
    println!("  Hostiles alive: {}", summary.living);
    println!("  Hostile bodies created: {}", summary.hostiles_created);
    println!("  Hostiles killed: {}", summary.hostile_deaths);
    println!(
        "  Strikes: {} ({} damaging)",
        summary.strikes, summary.damaging_strikes
    );
    println!(
        "  Towers: {} standing, {} destroyed",
        summary.towers_standing, summary.towers_destroyed
    );
    println!("  State hash: {:016x}", summary.state_hash);
}
