//! Replay command: play one puzzle with a trained genome.

use crate::cli::{CliError, PolicyArg};
use nonevo::evo::{CheckpointStore, EvalConfig, Genome, play_puzzle};
use nonevo::{PuzzleRepository, PuzzleState};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::path::PathBuf;

const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

/// Execute the run command.
pub(crate) fn execute(
    size: usize,
    policy: PolicyArg,
    best: bool,
    seed: Option<u64>,
    puzzles: PathBuf,
    checkpoints: PathBuf,
) -> Result<(), CliError> {
    let store = CheckpointStore::open(&checkpoints)?;
    let (genome, trained_fitness) = load_genome(&store, best)?;

    let repo_path = PuzzleRepository::default_path(&puzzles, size);
    let repository = PuzzleRepository::load(&repo_path, size)?;
    let mut rng = SmallRng::seed_from_u64(seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(42)
    }));

    let mut state = PuzzleState::sample(&repository, &mut rng)?;
    println!("Playing puzzle {} with genome (trained fitness {trained_fitness:.1})", state.puzzle_id());

    let config = EvalConfig {
        policy: policy.into(),
        ..EvalConfig::default()
    };
    let fitness = play_puzzle(&genome, &mut state, &config)?;

    println!("  Score: {}", state.score());
    println!("  Wrong guesses: {}/{}", state.guesses(), state.max_guesses());
    println!("  Replay fitness: {fitness:.1}");
    println!();
    print_comparison(&state);
    Ok(())
}

/// Load the best-slot genome, or the fittest genome of the latest
/// checkpoint.
fn load_genome(store: &CheckpointStore, best: bool) -> Result<(Genome, f64), CliError> {
    if best {
        let record = store
            .load_best()?
            .ok_or_else(|| CliError::new("no best genome saved yet"))?;
        return Ok((record.genome, record.fitness));
    }

    let checkpoint = store
        .load_latest()?
        .ok_or_else(|| CliError::new("no checkpoint found"))?;
    let (idx, fitness) = checkpoint
        .fitness
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .ok_or_else(|| CliError::new("checkpoint has no fitness values"))?;
    let genome = checkpoint
        .population
        .into_iter()
        .nth(idx)
        .ok_or_else(|| CliError::new("checkpoint fitness does not match its population"))?;
    Ok((genome, fitness))
}

/// Print the played grid next to the solution, marking wrong cells in red.
fn print_comparison(state: &PuzzleState) {
    let size = state.size();
    let grid = state.flatten();
    let solution = state.solution();

    println!("Solution:");
    for row in solution.chunks(size) {
        let line: Vec<String> = row.iter().map(ToString::to_string).collect();
        println!("  {}", line.join(" "));
    }

    println!("Played grid (red marks cells that differ from the solution):");
    for y in 0..size {
        let mut line = String::from("  ");
        for x in 0..size {
            let cell = grid[y * size + x];
            if cell == solution[y * size + x] {
                line.push_str(&format!("{cell} "));
            } else {
                line.push_str(&format!("{RED}{cell}{RESET} "));
            }
        }
        println!("{line}");
    }
}
