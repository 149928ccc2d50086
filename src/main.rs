use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info};

use climjob::dataset::Dataset;
use climjob::queue::Queue;
use climjob::script::writer::{FileWriterFactory, MemoryWriterFactory, WriterFactory};
use climjob::{Collaborators, Config, ScriptOrchestrator};

/// Generate PBS scripts that process climate datasets into time series
#[derive(Parser, Debug)]
#[command(name = "climjob", version)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    config: PathBuf,
    /// Only generate this dataset (can be repeated)
    #[arg(short, long = "dataset")]
    datasets: Vec<String>,
    /// Override the PBS queue from the configuration
    #[arg(short, long, value_enum)]
    queue: Option<Queue>,
    /// Render scripts in memory and print the wrapper instead of writing anything
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("climjob {} starting", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    if let Err(err) = run(args) {
        error!("Script generation failed");
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = Config::load(&args.config)
        .with_context(|| format!("Loading configuration {}", args.config.display()))?;
    if let Some(queue) = args.queue {
        info!("Overriding queue {} with {}", config.scheduler.queue, queue);
        config.scheduler.queue = queue;
    }
    let datasets = config.datasets(&args.datasets)?;
    let collaborators = Collaborators::from_config(&config, !args.dry_run)?;

    match args.dry_run {
        true => {
            let writers = MemoryWriterFactory::new();
            let wrapper = generate(&collaborators, &writers, &datasets)?;
            info!("--dry-run set, rendered {} scripts without writing them", writers.files().len());
            print!("{}", writers.get(&wrapper).unwrap_or_default());
        }
        false => {
            let wrapper = generate(&collaborators, &FileWriterFactory, &datasets)?;
            println!("Output directory: {}", config.paths.output_dir.display());
            println!("Submit every dataset with: bash {}", wrapper.display());
        }
    }
    Ok(())
}

fn generate(collaborators: &Collaborators, writers: &dyn WriterFactory, datasets: &[Dataset]) -> anyhow::Result<PathBuf> {
    let ctx = collaborators.context(writers);
    let orchestrator = ScriptOrchestrator::new(&ctx);
    let wrapper = orchestrator
        .generate_all(datasets)
        .context("Generating job scripts")?;
    Ok(wrapper)
}
