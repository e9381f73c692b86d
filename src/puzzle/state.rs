//! Mutable simulation of one nonogram instance.

use crate::error::PuzzleError;
use crate::puzzle::record::{PuzzleRecord, PuzzleRepository};
use rand::Rng;

/// Score assigned when the grid exactly matches the solution.
pub const WIN_SCORE: u32 = 1000;

/// Default number of wrong guesses allowed per evaluation.
pub const DEFAULT_MAX_GUESSES: u32 = 5;

/// Result of applying a single move to the grid.
///
/// None of these are errors: every failure mode of a move is reported
/// through this enum, never thrown, and never silently swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The marked cell is part of the solution; score incremented.
    Correct,
    /// The marked cell is not part of the solution; a guess was consumed.
    Incorrect,
    /// A wrong guess consumed the last of the guess budget. Terminal signal
    /// for the current evaluation, not an error.
    GuessLimitExceeded,
    /// The coordinate lies outside the grid; state is unchanged.
    OutOfBounds,
}

/// The state machine a solver plays against: clues, solution, mutable grid,
/// score, and the wrong-guess counter.
///
/// Each evaluation owns its own clone; nothing here is shared. Invariants:
/// a grid cell set to 1 is never reset within the state's lifetime, `guesses`
/// is non-decreasing, and `score` is non-decreasing except for the clamp to
/// [`WIN_SCORE`] on completion.
#[derive(Debug, Clone)]
pub struct PuzzleState {
    size: usize,
    puzzle_id: u32,
    grid: Vec<u8>,
    combined: Vec<u32>,
    solution: Vec<u8>,
    score: u32,
    guesses: u32,
    max_guesses: u32,
}

impl PuzzleState {
    /// Build a simulation from one record, copying its clue and solution
    /// fields.
    ///
    /// # Errors
    ///
    /// Returns a length-mismatch error if the record is malformed for the
    /// given size. Fatal to this construction only; the caller may retry
    /// with another record.
    pub fn from_record(record: &PuzzleRecord, size: usize) -> Result<Self, PuzzleError> {
        record.validate(size)?;
        Ok(Self {
            size,
            puzzle_id: record.id,
            grid: vec![0; size * size],
            combined: record.combined.clone(),
            solution: record.solution.clone(),
            score: 0,
            guesses: 0,
            max_guesses: DEFAULT_MAX_GUESSES,
        })
    }

    /// Build a simulation from a record selected uniformly at random.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected record is malformed.
    pub fn sample<R: Rng>(repo: &PuzzleRepository, rng: &mut R) -> Result<Self, PuzzleError> {
        Self::from_record(repo.choose(rng), repo.size())
    }

    /// Override the wrong-guess budget (defaults to [`DEFAULT_MAX_GUESSES`]).
    #[must_use]
    pub fn with_max_guesses(mut self, max_guesses: u32) -> Self {
        self.max_guesses = max_guesses;
        self
    }

    /// Mark the cell at `(x, y)` and evaluate it against the solution.
    ///
    /// Out-of-range coordinates leave all state untouched. Re-marking an
    /// already-set cell writes nothing new but is still evaluated against
    /// the solution.
    pub fn apply_move(&mut self, x: usize, y: usize) -> MoveOutcome {
        if x >= self.size || y >= self.size {
            return MoveOutcome::OutOfBounds;
        }
        let idx = y * self.size + x;
        self.grid[idx] = 1;
        if self.solution[idx] == 1 {
            self.score += 1;
            MoveOutcome::Correct
        } else {
            self.guesses += 1;
            if self.guesses >= self.max_guesses {
                MoveOutcome::GuessLimitExceeded
            } else {
                MoveOutcome::Incorrect
            }
        }
    }

    /// Compare the grid to the solution; on an exact match set the score to
    /// [`WIN_SCORE`] and return true. No side effects otherwise.
    pub fn check_complete(&mut self) -> bool {
        if self.grid == self.solution {
            self.score = WIN_SCORE;
            true
        } else {
            false
        }
    }

    /// Row-major view of the grid, used to build network input vectors.
    #[must_use]
    pub fn flatten(&self) -> &[u8] {
        &self.grid
    }

    /// Whether the cell at `(x, y)` has already been marked.
    #[must_use]
    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size && self.grid[y * self.size + x] == 1
    }

    /// Grid side length.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Identifier of the record this state was built from.
    #[must_use]
    pub fn puzzle_id(&self) -> u32 {
        self.puzzle_id
    }

    /// Packed clue vector of length `2 * size * size`.
    #[must_use]
    pub fn combined_tips(&self) -> &[u32] {
        &self.combined
    }

    /// Row-major solution cells.
    #[must_use]
    pub fn solution(&self) -> &[u8] {
        &self.solution
    }

    /// Current score.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Wrong guesses consumed so far.
    #[must_use]
    pub fn guesses(&self) -> u32 {
        self.guesses
    }

    /// Wrong-guess budget.
    #[must_use]
    pub fn max_guesses(&self) -> u32 {
        self.max_guesses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plus_state() -> PuzzleState {
        let record = PuzzleRecord {
            id: 1,
            tips_x: Vec::new(),
            tips_y: Vec::new(),
            combined: vec![0; 50],
            solution: vec![
                0, 0, 0, 0, 0, 0, 1, 1, 1, 0, 1, 1, 1, 1, 1, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0,
            ],
        };
        PuzzleState::from_record(&record, 5).unwrap()
    }

    #[test]
    fn test_construction_rejects_bad_lengths() {
        let record = PuzzleRecord {
            id: 2,
            tips_x: Vec::new(),
            tips_y: Vec::new(),
            combined: vec![0; 49],
            solution: vec![0; 25],
        };
        assert!(PuzzleState::from_record(&record, 5).is_err());
    }

    #[test]
    fn test_correct_move_increments_score() {
        let mut state = plus_state();
        assert_eq!(state.apply_move(2, 2), MoveOutcome::Correct);
        assert_eq!(state.score(), 1);
        assert_eq!(state.guesses(), 0);
        assert!(state.is_filled(2, 2));
    }

    #[test]
    fn test_wrong_move_consumes_guess() {
        let mut state = plus_state();
        assert_eq!(state.apply_move(0, 0), MoveOutcome::Incorrect);
        assert_eq!(state.score(), 0);
        assert_eq!(state.guesses(), 1);
        // The wrong cell is still marked.
        assert!(state.is_filled(0, 0));
    }

    #[test]
    fn test_guess_limit_signalled_on_fifth_wrong_move() {
        let mut state = plus_state();
        for (x, y) in [(0, 0), (4, 0), (0, 4), (4, 4)] {
            assert_eq!(state.apply_move(x, y), MoveOutcome::Incorrect);
        }
        assert_eq!(state.apply_move(0, 1), MoveOutcome::GuessLimitExceeded);
        assert_eq!(state.guesses(), 5);
    }

    #[test]
    fn test_out_of_bounds_leaves_state_unchanged() {
        let mut state = plus_state();
        state.apply_move(2, 2);
        let grid_before = state.flatten().to_vec();

        assert_eq!(state.apply_move(5, 0), MoveOutcome::OutOfBounds);
        assert_eq!(state.apply_move(0, 5), MoveOutcome::OutOfBounds);
        assert_eq!(state.flatten(), grid_before.as_slice());
        assert_eq!(state.score(), 1);
        assert_eq!(state.guesses(), 0);
    }

    #[test]
    fn test_remarking_correct_cell_keeps_guesses_unchanged() {
        let mut state = plus_state();
        assert_eq!(state.apply_move(2, 2), MoveOutcome::Correct);
        assert_eq!(state.apply_move(2, 2), MoveOutcome::Correct);
        assert!(state.is_filled(2, 2));
        assert_eq!(state.guesses(), 0);
    }

    #[test]
    fn test_check_complete_sets_win_score() {
        let mut state = plus_state();
        let solution = state.solution().to_vec();
        for (i, &cell) in solution.iter().enumerate() {
            if cell == 1 {
                state.apply_move(i % 5, i / 5);
            }
        }
        assert!(state.check_complete());
        assert_eq!(state.score(), WIN_SCORE);
    }

    #[test]
    fn test_check_complete_false_without_side_effects() {
        let mut state = plus_state();
        state.apply_move(2, 2);
        assert!(!state.check_complete());
        assert_eq!(state.score(), 1);
    }

    #[test]
    fn test_custom_guess_budget() {
        let mut state = plus_state().with_max_guesses(1);
        assert_eq!(state.apply_move(0, 0), MoveOutcome::GuessLimitExceeded);
    }
}
