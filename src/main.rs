use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use petri_spn::{
    parser::parse, persistence::SUMMARY_FILE, store_experiment, store_log, summarize,
    ExperimentConfig, Hyperparameters, RunCollection, StochasticNet, TIME_KEY,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Repeated Gillespie simulations of a stochastic Petri network")]
struct Args {
    /// Network description, in the `.petri` text format
    net: PathBuf,

    /// TOML file with the experiment settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    repetitions: Option<usize>,

    #[arg(long)]
    max_steps: Option<usize>,

    /// Let every run go on until the time limit or a dead state
    #[arg(long, conflicts_with = "max_steps")]
    unlimited_steps: bool,

    #[arg(long)]
    max_time: Option<f64>,

    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of timeboxes of the summary
    #[arg(long)]
    timeboxes: Option<usize>,

    /// Directory receiving the runs, the hyperparameters and the summary
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ExperimentConfig::default(),
        };

        if let Some(repetitions) = self.repetitions {
            config.repetitions = repetitions;
        }
        if let Some(max_steps) = self.max_steps {
            config.max_steps = Some(max_steps);
        }
        if self.unlimited_steps {
            config.max_steps = None;
        }
        if let Some(max_time) = self.max_time {
            config.max_time = max_time;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(timeboxes) = self.timeboxes {
            config.timeboxes = timeboxes;
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = args.config()?;

    let input = std::fs::read_to_string(&args.net)
        .with_context(|| format!("Failed to read {}", args.net.display()))?;
    let mut network =
        parse(&input).with_context(|| format!("Failed to parse {}", args.net.display()))?;

    info!(
        "Loaded {} places and {} transitions from {}",
        network.places().len(),
        network.transition_count(),
        args.net.display()
    );

    let hyperparameters = Hyperparameters::from_network(&network);
    let runs = simulate(&mut network, &config)?;

    store_experiment(&config.output, &runs, &hyperparameters)?;

    let places = network
        .places()
        .into_iter()
        .map(|(name, _)| name)
        .collect::<Vec<_>>();
    let places = places.iter().map(String::as_str).collect::<Vec<_>>();
    let summary = summarize(&runs, TIME_KEY, &places, config.timeboxes)?;
    store_log(&summary, config.output.join(SUMMARY_FILE))?;

    info!("Results written to {}", config.output.display());
    Ok(())
}

#[cfg(feature = "parallel")]
fn simulate(network: &mut petri_spn::PetriNetwork, config: &ExperimentConfig) -> Result<RunCollection> {
    info!("Running {} repetitions in parallel", config.repetitions);
    Ok(petri_spn::run_repeated_parallel(
        &*network,
        config.repetitions,
        &config.run_settings(),
        config.seed,
    )?)
}

#[cfg(not(feature = "parallel"))]
fn simulate(network: &mut petri_spn::PetriNetwork, config: &ExperimentConfig) -> Result<RunCollection> {
    use petri_spn::simulator::LogProgress;

    Ok(petri_spn::run_repeated_seeded(
        network,
        config.repetitions,
        &config.run_settings(),
        config.seed,
        &mut LogProgress,
    )?)
}
