//! Fitness policies and their scoring formulas.
//!
//! Two divergent formulas existed across trainer variants; both are kept as
//! selectable strategies rather than hidden behind duplicated loops. The
//! evaluator drives the moves; the functions here turn the resulting puzzle
//! state into a scalar, clamped to be non-negative under every policy.

use crate::puzzle::PuzzleState;

/// Reward per correct move under the single-shot policy.
pub(crate) const CORRECT_REWARD: f64 = 10.0;

/// Penalty per wrong move under the single-shot policy.
pub(crate) const WRONG_PENALTY: f64 = 5.0;

/// Penalty for re-marking an already-filled cell under the single-shot
/// policy.
pub(crate) const REDUNDANT_PENALTY: f64 = 1.0;

/// Partial-credit reward per correctly filled cell under the single-shot
/// policy.
pub(crate) const FILLED_MATCH_REWARD: f64 = 5.0;

/// Scale of the wrong-guess penalty under the single-shot policy.
pub(crate) const GUESS_PENALTY_SCALE: f64 = 100.0;

/// Which evaluation protocol and scoring formula to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitnessPolicy {
    /// Per-cell protocol with grid feedback in the input vector.
    #[default]
    Sequential,
    /// One activation on the clues alone, one output per cell.
    SingleShot,
}

/// Cell traversal order for the sequential protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    /// `x` outer, `y` inner: the grid is walked column by column.
    #[default]
    ColumnMajor,
    /// All cells by flat index `i`, with `x = i % size`, `y = i / size`,
    /// walking the grid row by row.
    FlatIndex,
}

/// How cell coordinates are encoded in the input vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordEncoding {
    /// `x / size`, `y / size`.
    #[default]
    Normalized,
    /// Raw `x`, `y`.
    Absolute,
}

/// Sequential-policy fitness from a finished evaluation.
///
/// `cells_guessed` counts the moves the genome chose to make; `halted` is
/// true when the guess budget stopped the traversal early.
#[must_use]
pub(crate) fn sequential_fitness(state: &PuzzleState, cells_guessed: usize, halted: bool) -> f64 {
    let cells = state.size() * state.size();
    let early_stop_penalty = if halted {
        cells.saturating_sub(cells_guessed)
    } else {
        0
    };
    let overshoot = state
        .guesses()
        .saturating_sub(state.max_guesses() + 1);
    let fitness =
        f64::from(state.score()) - f64::from(overshoot) - precise(early_stop_penalty);
    fitness.max(0.0)
}

/// Wrong-guess penalty term of the single-shot policy.
#[must_use]
pub(crate) fn guess_penalty(wrong_guesses: u32, max_guesses: u32) -> f64 {
    if max_guesses == 0 {
        return 0.0;
    }
    f64::from(wrong_guesses) / f64::from(max_guesses) * GUESS_PENALTY_SCALE
}

/// Number of cells that are filled in the grid and filled in the solution.
///
/// Partial credit deliberately ignores cells that are correct by omission,
/// so an untouched grid earns nothing.
#[must_use]
pub(crate) fn correct_filled_cells(state: &PuzzleState) -> usize {
    state
        .flatten()
        .iter()
        .zip(state.solution())
        .filter(|&(&g, &s)| g == 1 && s == 1)
        .count()
}

#[allow(clippy::cast_precision_loss)]
fn precise(n: usize) -> f64 {
    n as f64
}
