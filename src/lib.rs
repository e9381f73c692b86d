// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Nonevo: evolutionary training of nonogram puzzle solvers.
//!
//! Candidate solvers are parametric decision functions ("genomes") scored by
//! playing nonogram simulations under a wrong-guess budget. A generational
//! training loop evaluates every genome of a population against a shared
//! puzzle, delegates reproduction to an evolution engine, and persists
//! resumable checkpoints plus the best genome seen so far.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        Training Loop                │
//! ├─────────────────────────────────────┤
//! │   Genome Evaluation Protocol        │
//! ├─────────────────────────────────────┤
//! │    Puzzle Simulation (puzzle)       │
//! └─────────────────────────────────────┘
//! ```

pub mod error;
pub mod evo;
pub mod puzzle;

pub use error::PuzzleError;

// Re-export key types at the crate root for convenience
pub use evo::{CancelToken, EvalConfig, Genome, Network, Trainer, TrainerConfig};
pub use puzzle::{MoveOutcome, PuzzleRecord, PuzzleRepository, PuzzleState};
