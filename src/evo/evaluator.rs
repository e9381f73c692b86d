//! The genome-evaluation protocol: genome outputs → puzzle moves → fitness.
//!
//! Each genome is scored against an independent clone of the generation's
//! puzzle template. Evaluation failures (malformed output vectors) are
//! isolated per genome: the genome gets zero fitness and the generation
//! proceeds.

// Evaluation warnings go to stderr, matching the trainer's progress output
#![allow(clippy::print_stderr, clippy::cast_precision_loss)]

use crate::evo::fitness::{
    CORRECT_REWARD, CoordEncoding, FILLED_MATCH_REWARD, FitnessPolicy, REDUNDANT_PENALTY,
    Traversal, WRONG_PENALTY, correct_filled_cells, guess_penalty, sequential_fitness,
};
use crate::evo::genome::Network;
use crate::puzzle::{MoveOutcome, PuzzleState};
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag, checked between genome evaluations and
/// between generations so long runs can be stopped without corrupting
/// checkpoint state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Configuration for one genome evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvalConfig {
    /// Protocol and scoring formula.
    pub policy: FitnessPolicy,
    /// Cell traversal order (sequential policy).
    pub traversal: Traversal,
    /// Coordinate encoding in the input vector (sequential policy).
    pub coords: CoordEncoding,
    /// Revisit wrongly guessed cells after the main pass (sequential
    /// policy). The retry pass always encodes coordinates normalized.
    pub retry_wrong_guesses: bool,
    /// Target fitness; the single-shot policy awards exactly this value for
    /// a completed grid.
    pub fitness_threshold: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            policy: FitnessPolicy::Sequential,
            traversal: Traversal::ColumnMajor,
            coords: CoordEncoding::Normalized,
            retry_wrong_guesses: true,
            fitness_threshold: 1000.0,
        }
    }
}

impl EvalConfig {
    /// Input vector width the genome must accept for grids of `size`.
    #[must_use]
    pub fn input_width(&self, size: usize) -> usize {
        let cells = size * size;
        match self.policy {
            FitnessPolicy::Sequential => 2 * cells + cells + 2,
            FitnessPolicy::SingleShot => 2 * cells,
        }
    }

    /// Output vector width the genome must produce for grids of `size`.
    #[must_use]
    pub fn output_width(&self, size: usize) -> usize {
        match self.policy {
            FitnessPolicy::Sequential => 1,
            FitnessPolicy::SingleShot => size * size,
        }
    }
}

/// A genome produced an output vector the protocol cannot interpret.
#[derive(Debug, Clone, Copy)]
pub struct EvalError {
    /// Outputs the protocol needed.
    pub expected: usize,
    /// Outputs the genome produced.
    pub actual: usize,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "genome produced {} outputs, protocol needs {}",
            self.actual, self.expected
        )
    }
}

impl std::error::Error for EvalError {}

/// Evaluate one genome against its own clone of the template state.
///
/// Evaluation failures are caught here: the genome is scored zero and a
/// warning goes to stderr.
#[must_use]
pub fn evaluate_genome<N: Network + ?Sized>(
    net: &N,
    template: &PuzzleState,
    config: &EvalConfig,
) -> f64 {
    let mut state = template.clone();
    match play_puzzle(net, &mut state, config) {
        Ok(fitness) => fitness,
        Err(e) => {
            eprintln!("Warning: evaluation failed ({e}), fitness forced to 0");
            0.0
        }
    }
}

/// Drive `state` through the moves the genome dictates and return its
/// fitness. The state is left in its final position, which replay tooling
/// uses to render the played grid.
///
/// # Errors
///
/// Returns [`EvalError`] when the genome's output vector is shorter than the
/// protocol requires.
pub fn play_puzzle<N: Network + ?Sized>(
    net: &N,
    state: &mut PuzzleState,
    config: &EvalConfig,
) -> Result<f64, EvalError> {
    match config.policy {
        FitnessPolicy::Sequential => play_sequential(net, state, config),
        FitnessPolicy::SingleShot => play_single_shot(net, state, config),
    }
}

/// Assign fitness to every genome of a generation, in parallel.
///
/// Each worker owns one cloned state and one genome; no state crosses worker
/// boundaries. Genomes not yet evaluated when `cancel` fires are scored
/// zero, which is harmless because a cancelled run discards the generation.
#[must_use]
pub fn evaluate_generation<N: Network + Sync>(
    population: &[N],
    template: &PuzzleState,
    config: &EvalConfig,
    cancel: &CancelToken,
) -> Vec<f64> {
    population
        .par_iter()
        .map(|net| {
            if cancel.is_cancelled() {
                0.0
            } else {
                evaluate_genome(net, template, config)
            }
        })
        .collect()
}

fn play_sequential<N: Network + ?Sized>(
    net: &N,
    state: &mut PuzzleState,
    config: &EvalConfig,
) -> Result<f64, EvalError> {
    let size = state.size();
    let mut halted = false;
    let mut cells_guessed = 0usize;
    let mut wrong_cells: Vec<(usize, usize)> = Vec::new();

    for (x, y) in traversal_cells(size, config.traversal) {
        if halted {
            break;
        }
        if decide(net, state, x, y, config.coords)? {
            cells_guessed += 1;
            match state.apply_move(x, y) {
                MoveOutcome::GuessLimitExceeded => halted = true,
                MoveOutcome::Incorrect => wrong_cells.push((x, y)),
                MoveOutcome::Correct | MoveOutcome::OutOfBounds => {}
            }
        }
    }

    // Second look at the cells that were guessed wrong; re-marking them
    // consumes guesses again.
    if config.retry_wrong_guesses && !halted {
        for (x, y) in wrong_cells {
            if halted {
                break;
            }
            if decide(net, state, x, y, CoordEncoding::Normalized)?
                && state.apply_move(x, y) == MoveOutcome::GuessLimitExceeded
            {
                halted = true;
            }
        }
    }

    state.check_complete();
    Ok(sequential_fitness(state, cells_guessed, halted))
}

fn play_single_shot<N: Network + ?Sized>(
    net: &N,
    state: &mut PuzzleState,
    config: &EvalConfig,
) -> Result<f64, EvalError> {
    let size = state.size();
    let cells = size * size;
    let inputs: Vec<f64> = state.combined_tips().iter().map(|&t| f64::from(t)).collect();
    let outputs = net.activate(&inputs);
    if outputs.len() < cells {
        return Err(EvalError {
            expected: cells,
            actual: outputs.len(),
        });
    }

    let mut fitness = 0.0;
    let mut wrong_guesses = 0u32;
    for (i, &signal) in outputs.iter().take(cells).enumerate() {
        if signal <= 0.5 {
            continue;
        }
        let (x, y) = (i % size, i / size);
        if state.is_filled(x, y) {
            fitness -= REDUNDANT_PENALTY;
            continue;
        }
        match state.apply_move(x, y) {
            MoveOutcome::Correct => fitness += CORRECT_REWARD,
            MoveOutcome::Incorrect => {
                fitness -= WRONG_PENALTY;
                wrong_guesses += 1;
            }
            MoveOutcome::GuessLimitExceeded => {
                fitness -= WRONG_PENALTY;
                wrong_guesses += 1;
                break;
            }
            MoveOutcome::OutOfBounds => {}
        }
    }

    if state.check_complete() {
        fitness = config.fitness_threshold;
    } else {
        fitness += FILLED_MATCH_REWARD * correct_filled_cells(state) as f64;
    }
    fitness -= guess_penalty(wrong_guesses, state.max_guesses());
    Ok(fitness.max(0.0))
}

/// Whether the genome chooses to mark the cell at `(x, y)`.
fn decide<N: Network + ?Sized>(
    net: &N,
    state: &PuzzleState,
    x: usize,
    y: usize,
    coords: CoordEncoding,
) -> Result<bool, EvalError> {
    let inputs = build_inputs(state, x, y, coords);
    let outputs = net.activate(&inputs);
    let Some(&signal) = outputs.first() else {
        return Err(EvalError {
            expected: 1,
            actual: 0,
        });
    };
    Ok(signal > 0.5)
}

/// Input vector for one cell decision: clues, current flat grid, then the
/// cell coordinates.
fn build_inputs(state: &PuzzleState, x: usize, y: usize, coords: CoordEncoding) -> Vec<f64> {
    let size = state.size();
    let mut inputs = Vec::with_capacity(3 * size * size + 2);
    inputs.extend(state.combined_tips().iter().map(|&t| f64::from(t)));
    inputs.extend(state.flatten().iter().map(|&c| f64::from(c)));
    match coords {
        CoordEncoding::Normalized => {
            inputs.push(x as f64 / size as f64);
            inputs.push(y as f64 / size as f64);
        }
        CoordEncoding::Absolute => {
            inputs.push(x as f64);
            inputs.push(y as f64);
        }
    }
    inputs
}

fn traversal_cells(size: usize, order: Traversal) -> Box<dyn Iterator<Item = (usize, usize)>> {
    match order {
        Traversal::ColumnMajor => {
            Box::new((0..size).flat_map(move |x| (0..size).map(move |y| (x, y))))
        }
        Traversal::FlatIndex => Box::new((0..size * size).map(move |i| (i % size, i / size))),
    }
}
