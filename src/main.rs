//! CLI entry point for pdfclassifier-rs.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdfclassifier_rs::{Result, Trainer, TrainerConfig};

#[derive(Parser)]
#[command(name = "pdfclassifier")]
#[command(about = "YAML-driven adversarial training for a PDF malware classifier")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        config: String,
    },
    /// Start training
    Train {
        /// Path to configuration file
        config: String,
        /// Resume model parameters from the configured checkpoint
        #[arg(long)]
        resume: bool,
    },
    /// Evaluate the saved checkpoint on the held-out test set
    Evaluate {
        /// Path to configuration file
        config: String,
    },
    /// Generate a sample configuration file
    Init {
        /// Output path for config file
        #[arg(default_value = "config.yaml")]
        output: String,
        /// Training preset (baseline, mixed)
        #[arg(long, default_value = "mixed")]
        preset: String,
    },
}

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Validate { config } => {
            tracing::info!("Validating configuration: {}", config);
            let config = TrainerConfig::from_file(&config)?;
            config.validate()?;
            println!("✓ Configuration is valid");
            println!("  Mode: {:?}", config.mode);
            println!("  Train set: {}", config.data.train_path);
            println!("  Checkpoint: {}", config.checkpoint_path().display());
        }
        Commands::Train { config, resume } => {
            tracing::info!("Starting training with config: {}", config);
            let config = TrainerConfig::from_file(&config)?;

            let mut trainer = Trainer::new(config)?;
            trainer.train(resume)?;
        }
        Commands::Evaluate { config } => {
            tracing::info!("Evaluating checkpoint with config: {}", config);
            let config = TrainerConfig::from_file(&config)?;

            let mut trainer = Trainer::new(config)?;
            let result = trainer.evaluate_only()?;
            println!("✓ Test set {result}");
        }
        Commands::Init { output, preset } => {
            tracing::info!("Generating config for preset: {}", preset);
            let config = TrainerConfig::from_preset(&preset)?;
            config.to_file(&output)?;
            println!("✓ Configuration written to: {output}");
        }
    }

    Ok(())
}
