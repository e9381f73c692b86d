//! Nonevo CLI - train and replay evolved nonogram solvers.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Nonevo - evolutionary training of nonogram puzzle solvers
#[derive(Parser, Debug)]
#[command(name = "nonevo")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Train a population of solver genomes
    Train {
        /// Puzzle grid size
        #[arg(short, long, default_value = "5")]
        size: usize,

        /// Population size
        #[arg(short, long, default_value = "150")]
        population: usize,

        /// Generation limit
        #[arg(short, long, default_value = "1000")]
        generations: u32,

        /// Hidden neurons in fresh genomes (0 = direct connections)
        #[arg(long, default_value = "0")]
        hidden: usize,

        /// Fitness policy
        #[arg(long, default_value = "sequential")]
        policy: cli::PolicyArg,

        /// Encode move coordinates as raw values instead of normalized
        #[arg(long)]
        absolute_coords: bool,

        /// Skip the retry pass over wrongly guessed cells
        #[arg(long)]
        no_retry: bool,

        /// Fitness threshold for early termination
        #[arg(short = 't', long, default_value = "1000")]
        threshold: f64,

        /// Consecutive threshold generations required to stop
        #[arg(long, default_value = "10")]
        consecutive: u32,

        /// Checkpoint interval in generations
        #[arg(long, default_value = "5")]
        interval: u32,

        /// RNG seed (default: derived from the clock)
        #[arg(long)]
        seed: Option<u64>,

        /// Puzzle repository directory
        #[arg(long, default_value = "puzzles")]
        puzzles: std::path::PathBuf,

        /// Checkpoint output directory
        #[arg(short, long, default_value = "checkpoints")]
        output: std::path::PathBuf,

        /// Resume from the latest checkpoint
        #[arg(short, long)]
        resume: bool,

        /// Show a progress bar instead of per-generation logs
        #[arg(long)]
        progress: bool,
    },

    /// Play one puzzle with a trained genome and show the grid
    Run {
        /// Puzzle grid size
        #[arg(short, long, default_value = "5")]
        size: usize,

        /// Fitness policy the genome was trained under
        #[arg(long, default_value = "sequential")]
        policy: cli::PolicyArg,

        /// Use the best-genome slot instead of the latest checkpoint winner
        #[arg(short, long)]
        best: bool,

        /// RNG seed for puzzle selection (default: derived from the clock)
        #[arg(long)]
        seed: Option<u64>,

        /// Puzzle repository directory
        #[arg(long, default_value = "puzzles")]
        puzzles: std::path::PathBuf,

        /// Checkpoint directory
        #[arg(short, long, default_value = "checkpoints")]
        checkpoints: std::path::PathBuf,
    },

    /// Validate a puzzle repository file
    Validate {
        /// Puzzle repository JSON file
        #[arg(required = true)]
        file: std::path::PathBuf,

        /// Expected puzzle grid size
        #[arg(short, long, default_value = "5")]
        size: usize,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Train {
            size,
            population,
            generations,
            hidden,
            policy,
            absolute_coords,
            no_retry,
            threshold,
            consecutive,
            interval,
            seed,
            puzzles,
            output,
            resume,
            progress,
        } => cli::train::execute(
            size,
            population,
            generations,
            hidden,
            policy,
            absolute_coords,
            no_retry,
            threshold,
            consecutive,
            interval,
            seed,
            puzzles,
            output,
            resume,
            progress,
        ),

        Commands::Run {
            size,
            policy,
            best,
            seed,
            puzzles,
            checkpoints,
        } => cli::run::execute(size, policy, best, seed, puzzles, checkpoints),

        Commands::Validate { file, size } => cli::validate::execute(file, size),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
