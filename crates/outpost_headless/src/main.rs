//! Headless outpost runner.
//!
//! This binary runs block scenarios without graphics.
//! Designed for CI testing and scripted probing.
//!
//! # Usage
//!
//! ```bash
//! # Run a scenario and print JSON metrics
//! cargo run -p outpost_headless -- run --scenario scenarios/outpost_defense.ron
//!
//! # Verify determinism across repeated runs
//! cargo run -p outpost_headless -- verify --scenario scenarios/outpost_defense.ron --runs 5
//!
//! # Interactive mode - read commands from stdin
//! cargo run -p outpost_headless -- serve
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use outpost_headless::{
    runner::{verify_determinism, ScenarioRunner},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "outpost_headless")]
#[command(about = "Headless block simulation runner for CI and scripted probing")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print metrics as JSON
    Run {
        /// Scenario file to load (built-in outpost defense when omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Ticks to run (scenario default when omitted)
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Write metrics to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running a scenario several times
    Verify {
        /// Scenario file to load (built-in outpost defense when omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of runs to compare
        #[arg(short, long, default_value = "3")]
        runs: usize,

        /// Ticks per run (scenario default when omitted)
        #[arg(short, long)]
        ticks: Option<u64>,
    },

    /// Drive a scenario interactively with JSON lines on stdin
    Serve {
        /// Scenario file to load (built-in outpost defense when omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            ticks,
            output,
        }) => cmd_run(scenario, ticks, output),
        Some(Commands::Verify {
            scenario,
            runs,
            ticks,
        }) => cmd_verify(scenario, runs, ticks),
        Some(Commands::Serve { scenario }) => cmd_serve(scenario),
        None => cmd_serve(None),
    }
}

fn load_scenario(path: Option<PathBuf>) -> Scenario {
    let Some(path) = path else {
        return Scenario::outpost_defense();
    };
    match Scenario::load(&path) {
        Ok(scenario) => {
            tracing::info!("Loaded scenario: {}", scenario.name);
            scenario
        }
        Err(e) => {
            eprintln!("Failed to load scenario {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn build_runner(scenario: Scenario) -> ScenarioRunner {
    match ScenarioRunner::new(scenario) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Failed to build scenario: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run a scenario to completion
fn cmd_run(scenario: Option<PathBuf>, ticks: Option<u64>, output: Option<PathBuf>) {
    let runner = build_runner(load_scenario(scenario));
    let metrics = runner.run(ticks);

    let json = match metrics.to_json() {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to serialize metrics: {}", e);
            std::process::exit(1);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, json) {
                eprintln!("Failed to write {}: {}", path.display(), e);
                std::process::exit(1);
            }
            eprintln!("Metrics written to {}", path.display());
        }
        None => println!("{json}"),
    }
}

/// Verify determinism
fn cmd_verify(scenario: Option<PathBuf>, runs: usize, ticks: Option<u64>) {
    let scenario = load_scenario(scenario);
    tracing::info!(
        "Verifying determinism: {} ({} runs)",
        scenario.name,
        runs
    );

    let report = match verify_determinism(&scenario, runs, ticks) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Failed to build scenario: {}", e);
            std::process::exit(1);
        }
    };

    if report.is_deterministic() {
        eprintln!(
            "PASS: All {} runs produced identical results after {} ticks",
            runs, report.ticks
        );
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        for (run, hash) in report.hashes.iter().enumerate() {
            eprintln!("  run {run}: {hash:016x}");
        }
        std::process::exit(1);
    }
}

/// Serve JSON-line commands on stdin/stdout
fn cmd_serve(scenario: Option<PathBuf>) {
    let mut runner = build_runner(load_scenario(scenario));
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    if let Err(e) = runner.serve(stdin.lock(), stdout.lock()) {
        eprintln!("Session ended with error: {}", e);
        std::process::exit(1);
    }
}
