//! Nonogram puzzle data and simulation.
//!
//! A puzzle is defined by row/column run-length clues ("tips") and a
//! row-major binary solution. [`PuzzleRepository`] loads immutable records
//! from JSON files (one file per grid size); [`PuzzleState`] is the mutable
//! simulation that a solver plays against, enforcing move legality, scoring,
//! and the wrong-guess budget.

mod record;
mod state;

pub use record::{PuzzleRecord, PuzzleRepository};
pub use state::{DEFAULT_MAX_GUESSES, MoveOutcome, PuzzleState, WIN_SCORE};
