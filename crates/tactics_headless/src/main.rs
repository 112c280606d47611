//! Headless tactics runner.
//!
//! Plays a scenario without graphics and streams events as JSON lines.
//!
//! # Usage
//!
//! ```bash
//! # Play the built-in skirmish at full speed
//! cargo run -p tactics_headless -- run --fast-forward
//!
//! # Play a scenario file with a settling pause between AI units
//! cargo run -p tactics_headless -- run --scenario scenarios/skirmish.ron --delay-ms 300
//!
//! # Validate a scenario file
//! cargo run -p tactics_headless -- validate --scenario scenarios/skirmish.ron
//! ```
//!
//! # Protocol
//!
//! Output (stdout): JSON events, one per line
//! Logs (stderr): Debug information
//!
//! Ctrl-C stops the run between two AI units and still reports `game_over`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tactics_headless::{
    pacer::{cancel_channel, Pacer},
    runner::{GameRunner, RunConfig},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "tactics_headless")]
#[command(about = "Headless tactics runner for AI testing and CI")]
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
    /// Play a scenario
    Run {
        /// Scenario file to load (built-in skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Override the scenario's round limit
        #[arg(short, long)]
        rounds: Option<u32>,

        /// Settling pause between AI units, in milliseconds
        #[arg(long, default_value = "0")]
        delay_ms: u64,

        /// Skip every settling pause
        #[arg(long)]
        fast_forward: bool,
    },

    /// Load and build a scenario without playing it
    Validate {
        /// Scenario file to check
        #[arg(short, long)]
        scenario: PathBuf,
    },
}

#[tokio::main]
async fn main() {
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
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            rounds,
            delay_ms,
            fast_forward,
        }) => {
            cmd_run(scenario, rounds, delay_ms, fast_forward).await;
        }
        Some(Commands::Validate { scenario }) => {
            cmd_validate(scenario);
        }
        None => {
            // Default: built-in skirmish, no pauses
            cmd_run(None, None, 0, true).await;
        }
    }
}

fn load_scenario(path: Option<PathBuf>) -> Scenario {
    let Some(path) = path else {
        tracing::info!("Using built-in skirmish");
        return Scenario::skirmish();
    };
    match Scenario::load(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load scenario: {}", e);
            std::process::exit(1);
        }
    }
}

/// Play one game
async fn cmd_run(scenario: Option<PathBuf>, rounds: Option<u32>, delay_ms: u64, fast_forward: bool) {
    let scenario = load_scenario(scenario);
    let config = RunConfig { rounds };

    let mut runner = match GameRunner::new(&scenario, &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to start game: {}", e);
            std::process::exit(1);
        }
    };

    let (cancel, rx) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping after the current unit");
            cancel.cancel();
        }
    });

    let mut pacer = Pacer::new(Duration::from_millis(delay_ms), fast_forward, rx);
    let mut stdout = std::io::stdout().lock();
    match runner.run(&mut pacer, &mut stdout).await {
        Ok(summary) => {
            eprintln!("Result: {:?} after {} rounds", summary.result, summary.rounds);
            eprintln!("State hash: {:016x}", summary.hash);
        }
        Err(e) => {
            eprintln!("Run failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Validate a scenario file
fn cmd_validate(path: PathBuf) {
    let scenario = load_scenario(Some(path));
    match scenario.build_battlefield() {
        Ok(battlefield) => {
            eprintln!("Scenario: {}", scenario.name);
            if !scenario.description.is_empty() {
                eprintln!("  {}", scenario.description);
            }
            eprintln!(
                "  Map: {}x{}, {} units, {} rounds",
                battlefield.grid().width(),
                battlefield.grid().height(),
                battlefield.units().count(),
                scenario.rounds
            );
            for row in battlefield.grid().to_ascii() {
                eprintln!("  {row}");
            }
            eprintln!("PASS");
        }
        Err(e) => {
            eprintln!("FAIL: {}", e);
            std::process::exit(1);
        }
    }
}
