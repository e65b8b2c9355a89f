//! Afterstate CLI - self-play training, evaluation and interactive play
//!
//! This CLI provides a unified interface for:
//! - Training an agent by self-play with periodic checkpoints
//! - Evaluating values against a random agent or another saved agent
//! - Playing against trained values in the console

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "afterstate")]
#[command(version, about = "Afterstate Q-learning for tic-tac-toe", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent by self-play
    Train(Box<afterstate::cli::commands::train::TrainArgs>),

    /// Evaluate trained values against opponents
    Evaluate(afterstate::cli::commands::evaluate::EvaluateArgs),

    /// Play against trained values
    Play(afterstate::cli::commands::play::PlayArgs),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => afterstate::cli::commands::train::execute(*args),
        Commands::Evaluate(args) => afterstate::cli::commands::evaluate::execute(args),
        Commands::Play(args) => afterstate::cli::commands::play::execute(args),
    }
}
