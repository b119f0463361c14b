use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use quadforce::io::{FormatRegistry, JsonWriter, Writer};
use quadforce::{GraphDocument, LayoutDocument, Simulation, SimulationParameters};

mod cli;

use cli::{Cli, Commands, LayoutArgs};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("quadforce=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quadforce=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn layout(args: &LayoutArgs) -> anyhow::Result<()> {
    let mut params = match &args.config {
        Some(path) => SimulationParameters::load(path)
            .with_context(|| format!("failed to load parameters from {}", path.display()))?,
        None => SimulationParameters::default(),
    };
    if let Some(seed) = args.seed {
        params.seed = Some(seed);
    }
    if args.unbounded {
        params.area = None;
    }

    let graph = GraphDocument::load(&args.input)
        .with_context(|| format!("failed to read graph from {}", args.input.display()))?;
    let mut simulation = Simulation::new(params)?;
    graph.populate(&mut simulation)?;

    let report =
        simulation.run_until_settled(args.time_step, args.energy_threshold, args.max_ticks);
    let layout = LayoutDocument::new(&simulation, report);

    match &args.output {
        Some(path) => {
            let registry = FormatRegistry::with_defaults();
            registry.writer_for_path(path)?.write(&layout, path)?;
            tracing::info!(
                path = %path.display(),
                bodies = layout.positions.len(),
                "wrote layout"
            );
        }
        None => print!("{}", JsonWriter.render(&layout)?),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Layout(args) => layout(&args)?,
        Commands::Defaults => print!("{}", SimulationParameters::default().to_yaml()?),
    }

    Ok(())
}
