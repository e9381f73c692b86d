//! Training command implementation.

#![allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]

use crate::cli::{CliError, PolicyArg};
use indicatif::{ProgressBar, ProgressStyle};
use nonevo::evo::{
    CancelToken, CoordEncoding, EvalConfig, GeneticEngine, Trainer, TrainingOutcome,
};
use nonevo::TrainerConfig;
use std::path::PathBuf;

/// Execute the train command.
pub(crate) fn execute(
    size: usize,
    population: usize,
    generations: u32,
    hidden: usize,
    policy: PolicyArg,
    absolute_coords: bool,
    no_retry: bool,
    threshold: f64,
    consecutive: u32,
    interval: u32,
    seed: Option<u64>,
    puzzles: PathBuf,
    output: PathBuf,
    resume: bool,
    progress: bool,
) -> Result<(), CliError> {
    let config = TrainerConfig {
        size,
        population_size: population,
        hidden_count: hidden,
        max_generations: generations,
        fitness_threshold: threshold,
        consecutive_threshold: consecutive,
        checkpoint_interval: interval,
        checkpoint_dir: output,
        puzzle_dir: puzzles,
        seed: seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(42)
        }),
        resume,
        eval: EvalConfig {
            policy: policy.into(),
            coords: if absolute_coords {
                CoordEncoding::Absolute
            } else {
                CoordEncoding::Normalized
            },
            retry_wrong_guesses: !no_retry,
            fitness_threshold: threshold,
            ..EvalConfig::default()
        },
        verbose: !progress,
        ..TrainerConfig::default()
    };

    println!("Starting training:");
    println!("  Puzzle size: {size}x{size}");
    println!("  Population: {population}");
    println!("  Generations: {generations}");
    println!("  Fitness threshold: {threshold} ({consecutive} consecutive)");
    println!("  Seed: {}", config.seed);
    println!("  Checkpoints: {}", config.checkpoint_dir.display());
    println!();

    let trainer = Trainer::new(config, GeneticEngine::default())?;

    let report = if progress {
        let bar = ProgressBar::new(u64::from(generations));
        bar.set_style(
            ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} generations {msg}",
            )
            .map_err(|e| CliError::new(e.to_string()))?,
        );
        let report = trainer.run_with_observer(&CancelToken::new(), |stats| {
            bar.set_position(u64::from(stats.generation) + 1);
            bar.set_message(format!("best {:.1}", stats.best_fitness));
        })?;
        bar.finish();
        report
    } else {
        trainer.run(&CancelToken::new())?
    };

    println!();
    match report.outcome {
        TrainingOutcome::ThresholdMet { generation } => {
            println!("Fitness threshold met at generation {generation}");
        }
        TrainingOutcome::MaxGenerationsReached => {
            println!("Reached maximum generations");
        }
        TrainingOutcome::Cancelled { generation } => {
            println!("Cancelled after generation {generation}");
        }
    }
    println!(
        "  Best fitness: {:.1} (generation {})",
        report.best_fitness, report.best_generation
    );
    println!("  Elapsed time: {:.1}s", report.elapsed_seconds);
    Ok(())
}
