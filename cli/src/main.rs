//! Scenario runner
//!
//! Loads a JSON scenario, runs its replications and writes the results.
//!
//! Usage: `hpath-sim <config.json> [--reps N] [--seed S] [--sim-hours H] [--output FILE]`

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use hpath_sim_core::{run_replications, Config, Progress};

#[derive(Parser, Debug)]
#[command(name = "hpath-sim")]
#[command(about = "Run a histopathology lab simulation scenario")]
struct Args {
    /// Path to the scenario configuration (JSON)
    config: PathBuf,

    /// Override the number of replications
    #[arg(long)]
    reps: Option<usize>,

    /// Override the master seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the simulation horizon, in hours
    #[arg(long = "sim-hours")]
    sim_hours: Option<f64>,

    /// Write results as JSON to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print one result digest per replication after the run
    #[arg(long)]
    digest: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    let file = File::open(&args.config)
        .with_context(|| format!("opening {}", args.config.display()))?;
    let mut config = Config::from_reader(BufReader::new(file))
        .with_context(|| format!("reading {}", args.config.display()))?;

    if let Some(reps) = args.reps {
        config.num_reps = reps;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(sim_hours) = args.sim_hours {
        config.sim_hours = sim_hours;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = Arc::new(load_config(&args)?);
    let progress = Arc::new(Progress::new());
    let results = run_replications(Arc::clone(&config), Arc::clone(&progress))?;

    info!(
        replications = progress.replications_done(),
        completed = progress.specimens_completed(),
        "all replications finished"
    );

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, &results).context("writing results")?;
    writeln!(writer)?;
    writer.flush()?;

    if args.digest {
        for result in &results {
            eprintln!("replication {}: {}", result.replication, result.digest()?);
        }
    }

    Ok(())
}
