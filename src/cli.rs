use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use quadforce::DEFAULT_ENERGY_THRESHOLD;

/// Force-directed layout for weighted graphs
#[derive(Parser, Debug)]
#[command(name = "quadforce")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log debug events, whatever RUST_LOG says
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lay out a graph file and write the final positions
    Layout(LayoutArgs),
    /// Print the default simulation parameters as YAML
    Defaults,
}

#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Graph file (.json, .yaml or .yml)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Simulation parameters (.json, .yaml or .yml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Layout file (.json, .yaml or .csv); JSON on stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Elapsed time passed to every tick
    #[arg(long, default_value_t = 0.2, value_parser = positive)]
    pub time_step: f64,

    /// Stop once a tick returns no more energy than this
    #[arg(long, default_value_t = DEFAULT_ENERGY_THRESHOLD)]
    pub energy_threshold: f64,

    /// Give up after this many ticks
    #[arg(long, default_value_t = 1000)]
    pub max_ticks: usize,

    /// Seed for random placement, overriding the parameters file
    #[arg(long)]
    pub seed: Option<u64>,

    /// Let bodies roam without bounds, overriding the parameters file
    #[arg(long)]
    pub unbounded: bool,
}

fn positive(value: &str) -> Result<f64, String> {
    let parsed: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if parsed.is_finite() && parsed > 0.0 {
        Ok(parsed)
    } else {
        Err(format!("must be a positive number, got {value}"))
    }
}
