//! grpo: evaluate the GRPO objective from the command line
//!
//! Provides subcommands:
//!
//! - `eval`  -- Evaluate a group described in a JSON file
//! - `demo`  -- Evaluate a randomly generated group

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use grpo_objective::{Group, GrpoConfig, GrpoObjective, GrpoOutput};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Evaluate the GRPO loss and per-sample gradient signal for a group.
#[derive(Parser)]
#[command(name = "grpo", version, about)]
struct Cli {
    /// Path to a JSON hyperparameter file (uses defaults if not provided).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the clipping epsilon.
    #[arg(long, global = true)]
    epsilon: Option<f64>,

    /// Override the KL penalty coefficient.
    #[arg(long, global = true)]
    beta: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a group read from a JSON file.
    Eval {
        /// JSON file holding `group` and `log_probs_new`.
        #[arg(long)]
        input: PathBuf,
    },

    /// Evaluate a randomly generated group.
    Demo {
        /// Number of samples in the group.
        #[arg(long, default_value_t = 5)]
        group_size: usize,

        /// Seed for the random generator (random if not provided).
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Contents of the file passed to `eval`.
#[derive(Deserialize)]
struct EvalInput {
    group: Group,
    log_probs_new: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Entrypoint
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // Initialise tracing (reads RUST_LOG env var, defaults to info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str::<GrpoConfig>(&text)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        }
        None => GrpoConfig::default(),
    };
    if let Some(epsilon) = cli.epsilon {
        config.clip_epsilon = epsilon;
    }
    if let Some(beta) = cli.beta {
        config.kl_coeff = beta;
    }

    let objective = GrpoObjective::new(config).context("Invalid GRPO hyperparameters")?;

    match cli.command {
        Commands::Eval { input } => cmd_eval(&objective, &input),
        Commands::Demo { group_size, seed } => cmd_demo(&objective, group_size, seed),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_eval(objective: &GrpoObjective, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let input: EvalInput = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse group from {}", path.display()))?;

    tracing::info!(
        group_size = input.group.group_size(),
        epsilon = objective.epsilon(),
        beta = objective.beta(),
        "Evaluating GRPO objective"
    );

    let output = objective
        .compute_loss(&input.group, &input.log_probs_new)
        .context("GRPO evaluation failed")?;

    print_output(&output);
    Ok(())
}

fn cmd_demo(objective: &GrpoObjective, group_size: usize, seed: Option<u64>) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut sample = |n: usize| -> Vec<f64> { (0..n).map(|_| rng.gen_range(-2.0..2.0)).collect() };

    let group = Group::new(sample(group_size), sample(group_size), sample(group_size))
        .context("Failed to build demo group")?;
    let log_probs_new = sample(group_size);

    tracing::info!(group_size, seed, "Evaluating random demo group");

    let output = objective
        .compute_loss(&group, &log_probs_new)
        .context("GRPO evaluation failed")?;

    print_output(&output);
    Ok(())
}

fn print_output(output: &GrpoOutput) {
    println!("Loss: {:.6}", output.loss);
    println!("Gradients:");
    for (i, g) in output.grad.iter().enumerate() {
        println!("  [{i}] {g:.6}");
    }
    println!();
    println!("Diagnostics:");
    println!("  mean advantage: {:.6}", output.stats.mean_advantage);
    println!("  mean ratio:     {:.6}", output.stats.mean_ratio);
    println!("  clip fraction:  {:.2}%", output.stats.clip_fraction * 100.0);
    println!("  mean KL:        {:.6}", output.stats.mean_kl);
    println!("  mean surrogate: {:.6}", output.stats.mean_surrogate);
}
