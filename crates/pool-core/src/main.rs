//! Social Pool Run Driver
//!
//! Runs one model (or a parallel seed sweep) from a TOML configuration plus
//! command line overrides, and optionally records per-tick snapshots and
//! events as JSONL.

use clap::{Parser, ValueEnum};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pool_core::batch::{run_batch, seed_sweep};
use pool_core::config::DEFAULT_CONFIG_PATH;
use pool_core::output::JsonlWriter;
use pool_core::{FrustratedEncounter, Model, PolicyConfig, PolicyKind, SimulationConfig};

/// Transition table selectable from the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Calhoun,
    CalhounConsoled,
    PairBucket,
}

impl From<PolicyArg> for PolicyConfig {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Calhoun => PolicyConfig {
                kind: PolicyKind::Calhoun,
                frustrated_encounter: FrustratedEncounter::Unaffected,
            },
            PolicyArg::CalhounConsoled => PolicyConfig {
                kind: PolicyKind::Calhoun,
                frustrated_encounter: FrustratedEncounter::Consoled,
            },
            PolicyArg::PairBucket => PolicyConfig {
                kind: PolicyKind::PairBucket,
                frustrated_encounter: FrustratedEncounter::Unaffected,
            },
        }
    }
}

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "social_pool")]
#[command(about = "Calhoun's social pool as an encounter-driven agent simulation")]
struct Args {
    /// TOML configuration file (defaults to social_pool.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 100)]
    ticks: u64,

    /// Number of balls
    #[arg(long)]
    population: Option<u32>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Wrap movement around the grid edges
    #[arg(long)]
    toroidal: bool,

    /// Transition table to use
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Write one JSON snapshot per tick to this file
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// Write every encounter and state change to this file
    #[arg(long)]
    events: Option<PathBuf>,

    /// Log state counts every N ticks
    #[arg(long, default_value_t = 10)]
    report_every: u64,

    /// Run N consecutive seeds in parallel and print one summary per run
    #[arg(long)]
    sweep_seeds: Option<u32>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = load_config(args)?;

    match args.sweep_seeds {
        Some(count) => run_sweep(&config, count, args.ticks),
        None => run_single(config, args),
    }
}

/// File configuration with command line overrides applied
fn load_config(args: &Args) -> Result<SimulationConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => SimulationConfig::load(DEFAULT_CONFIG_PATH)?,
        None => {
            warn!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
            SimulationConfig::default()
        }
    };

    if let Some(seed) = args.seed {
        config.random_seed = seed;
    }
    if let Some(population) = args.population {
        config.population_size = population;
    }
    if let Some(width) = args.width {
        config.grid_width = width;
    }
    if let Some(height) = args.height {
        config.grid_height = height;
    }
    if args.toroidal {
        config.toroidal = true;
    }
    if let Some(policy) = args.policy {
        config.policy = policy.into();
    }

    config.validate()?;
    Ok(config)
}

fn run_single(config: SimulationConfig, args: &Args) -> Result<(), Box<dyn Error>> {
    let mut model = Model::new(config)?;
    let mut snapshots = JsonlWriter::optional(args.snapshots.as_deref())?;
    let mut events = JsonlWriter::optional(args.events.as_deref())?;

    snapshots.write(model.snapshot())?;

    for _ in 0..args.ticks {
        let snapshot = model.step()?;
        snapshots.write(snapshot)?;
        events.write_batch(model.events())?;

        let snapshot = model.snapshot();
        if args.report_every > 0 && snapshot.tick % args.report_every == 0 {
            info!(
                tick = snapshot.tick,
                gratified = snapshot.counts.gratified,
                need = snapshot.counts.need,
                frustrated = snapshot.counts.frustrated,
                encounters = snapshot.encounters,
                crowded_cells = model.grid().crowded_cells(),
                "progress"
            );
        }
    }

    snapshots.flush()?;
    events.flush()?;

    let summary = model.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    if args.snapshots.is_some() || args.events.is_some() {
        info!(
            snapshots = snapshots.record_count(),
            events = events.record_count(),
            "output written"
        );
    }
    Ok(())
}

fn run_sweep(base: &SimulationConfig, count: u32, ticks: u64) -> Result<(), Box<dyn Error>> {
    let configs = seed_sweep(base, count);
    info!(runs = configs.len(), ticks, "starting seed sweep");

    let mut failures = 0;
    for (config, result) in configs.iter().zip(run_batch(&configs, ticks)) {
        match result {
            Ok(summary) => println!("{}", serde_json::to_string(&summary)?),
            Err(e) => {
                failures += 1;
                error!(seed = config.random_seed, "run failed: {}", e);
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} of {count} runs failed").into());
    }
    Ok(())
}
