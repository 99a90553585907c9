//! Latentbridge binary
//!
//! Runs contrastive latent alignment and the toy drift simulation.
//!
//! # Usage
//! ```bash
//! latentbridge align [--epochs 240] [--seed 7] [--output-dir artifacts] [--verbose]
//! latentbridge drift [--alpha 0.1] [--beta 0.05] [--steps 100]
//! latentbridge init-config [latentbridge.json]
//! ```

use clap::{Args, Parser, Subcommand};
use latentbridge_core::{run_alignment, AlignmentConfig, DriftConfig, DriftSimulator};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Latentbridge - contrastive alignment of simulated and real latents
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the projector and store the contrastive story
    Align(AlignArgs),

    /// Simulate a scalar latent drifting under a sinusoidal gate
    Drift {
        /// Mean-reversion rate
        #[arg(long, default_value = "0.1")]
        alpha: f64,

        /// Gate frequency
        #[arg(long, default_value = "0.05")]
        beta: f64,

        /// Number of updates
        #[arg(long, default_value = "100")]
        steps: usize,

        /// Seed for a reproducible trace
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Write the default alignment configuration as JSON
    InitConfig {
        /// Destination file
        #[arg(default_value = "latentbridge.json")]
        path: PathBuf,
    },
}

#[derive(Args)]
struct AlignArgs {
    /// JSON configuration file; flags below override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of paired latents
    #[arg(long)]
    samples: Option<usize>,

    /// Latent width
    #[arg(long)]
    latent_dim: Option<usize>,

    /// Drift magnitude between simulated and real populations
    #[arg(long)]
    shift: Option<f64>,

    /// Projector hidden width
    #[arg(long)]
    proj_dim: Option<usize>,

    /// Similarity temperature
    #[arg(long)]
    temperature: Option<f64>,

    /// Training epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Adam learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Mini-batch size
    #[arg(long)]
    batch_size: Option<usize>,

    /// Master seed for sampling, initialisation and shuffling
    #[arg(long)]
    seed: Option<u64>,

    /// Directory the story is written to
    #[arg(long, default_value = "artifacts")]
    output_dir: PathBuf,

    /// File stem of the stored story
    #[arg(long, default_value = "contrastive_story")]
    name: String,

    /// Also print the stored document
    #[arg(long)]
    json: bool,
}

impl AlignArgs {
    fn to_config(&self) -> anyhow::Result<AlignmentConfig> {
        let mut config = match &self.config {
            Some(path) => AlignmentConfig::from_file(path)?,
            None => AlignmentConfig::default(),
        };

        if let Some(n) = self.samples {
            config = config.with_samples(n);
        }
        if let Some(d) = self.latent_dim {
            config = config.with_latent_dim(d);
        }
        if let Some(s) = self.shift {
            config = config.with_shift_strength(s);
        }
        if let Some(p) = self.proj_dim {
            config = config.with_proj_dim(p);
        }
        if let Some(t) = self.temperature {
            config = config.with_temperature(t);
        }
        if let Some(e) = self.epochs {
            config = config.with_epochs(e);
        }
        if let Some(lr) = self.lr {
            config = config.with_learning_rate(lr);
        }
        if let Some(b) = self.batch_size {
            config = config.with_batch_size(b);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        Ok(config)
    }
}

/// Logging filter: explicit directives win, otherwise debug or info
fn log_filter(verbose: bool, directives: Option<&str>) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose, directives.as_deref()))
        .with_target(cli.verbose)
        .init();

    match cli.command {
        Commands::Align(args) => {
            let config = args.to_config()?;
            tracing::info!(
                samples = config.sampler.n_samples,
                latent_dim = config.sampler.latent_dim,
                epochs = config.trainer.epochs,
                "loaded alignment configuration"
            );

            let report = run_alignment(&config)?;
            let path = report.write_to(&args.output_dir, &args.name)?;

            if args.json {
                println!("{}", report.to_json()?);
            }
            println!("Stored contrastive story at {}", path.display());
        }
        Commands::Drift {
            alpha,
            beta,
            steps,
            seed,
        } => {
            let config = DriftConfig {
                alpha,
                beta,
                steps,
                ..Default::default()
            };
            let mut simulator = match seed {
                Some(seed) => DriftSimulator::seeded(config, seed),
                None => DriftSimulator::new(config),
            };
            println!("{}", serde_json::to_string_pretty(&simulator.report()?)?);
        }
        Commands::InitConfig { path } => {
            AlignmentConfig::default().to_file(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}
