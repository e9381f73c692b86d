//! Property-based tests for the puzzle simulation and fitness policies.
//!
//! Run with: cargo test prop_puzzle

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use nonevo::evo::{EvalConfig, FitnessPolicy, Network, evaluate_genome};
use nonevo::{MoveOutcome, PuzzleRecord, PuzzleState};

/// Stub that replays a fixed output vector for every activation.
struct FixedOutput(Vec<f64>);

impl Network for FixedOutput {
    fn activate(&self, _inputs: &[f64]) -> Vec<f64> {
        self.0.clone()
    }
}

fn record(size: usize, solution: Vec<u8>) -> PuzzleRecord {
    PuzzleRecord {
        id: 0,
        tips_x: Vec::new(),
        tips_y: Vec::new(),
        combined: vec![0; 2 * size * size],
        solution,
    }
}

fn solution_strategy(size: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..=1, size * size)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A cell once set is never reset, and guesses/score never decrease.
    #[test]
    fn prop_state_invariants_hold_under_any_moves(
        solution in solution_strategy(5),
        moves in prop::collection::vec((0usize..7, 0usize..7), 0..40)
    ) {
        let mut state = PuzzleState::from_record(&record(5, solution), 5).unwrap();
        let mut seen_filled = vec![false; 25];

        for (x, y) in moves {
            let score_before = state.score();
            let guesses_before = state.guesses();
            state.apply_move(x, y);

            prop_assert!(state.score() >= score_before);
            prop_assert!(state.guesses() >= guesses_before);

            for idx in 0..25 {
                let filled = state.flatten()[idx] == 1;
                prop_assert!(filled || !seen_filled[idx]);
                seen_filled[idx] = filled;
            }
        }
    }

    /// Out-of-bounds moves are reported and leave all state byte-for-byte
    /// unchanged.
    #[test]
    fn prop_out_of_bounds_is_pure(
        solution in solution_strategy(5),
        x in 5usize..100,
        y in 0usize..100,
    ) {
        let mut state = PuzzleState::from_record(&record(5, solution), 5).unwrap();
        state.apply_move(2, 2);
        let grid_before = state.flatten().to_vec();
        let score_before = state.score();
        let guesses_before = state.guesses();

        prop_assert_eq!(state.apply_move(x, y), MoveOutcome::OutOfBounds);
        prop_assert_eq!(state.apply_move(y, x.max(5)), MoveOutcome::OutOfBounds);
        prop_assert_eq!(state.flatten(), grid_before.as_slice());
        prop_assert_eq!(state.score(), score_before);
        prop_assert_eq!(state.guesses(), guesses_before);
    }

    /// Completion is reported exactly when the grid equals the solution,
    /// and then the score is exactly 1000.
    #[test]
    fn prop_completion_iff_exact_match(solution in solution_strategy(5)) {
        let mut state = PuzzleState::from_record(&record(5, solution.clone()), 5).unwrap();

        for (i, &cell) in solution.iter().enumerate() {
            if cell == 1 {
                state.apply_move(i % 5, i / 5);
            }
        }

        let matches = state.flatten() == solution.as_slice();
        prop_assert_eq!(matches, state.check_complete());
        if matches {
            prop_assert_eq!(state.score(), 1000);
        }
    }

    /// Fitness has a floor of zero under the sequential policy.
    #[test]
    fn prop_sequential_fitness_never_negative(
        solution in solution_strategy(5),
        signal in 0.0f64..1.0,
    ) {
        let state = PuzzleState::from_record(&record(5, solution), 5).unwrap();
        let net = FixedOutput(vec![signal]);
        let fitness = evaluate_genome(&net, &state, &EvalConfig::default());
        prop_assert!(fitness >= 0.0);
    }

    /// Fitness has a floor of zero under the single-shot policy.
    #[test]
    fn prop_single_shot_fitness_never_negative(
        solution in solution_strategy(5),
        outputs in prop::collection::vec(0.0f64..1.0, 25),
    ) {
        let state = PuzzleState::from_record(&record(5, solution), 5).unwrap();
        let net = FixedOutput(outputs);
        let config = EvalConfig {
            policy: FitnessPolicy::SingleShot,
            ..EvalConfig::default()
        };
        let fitness = evaluate_genome(&net, &state, &config);
        prop_assert!(fitness >= 0.0);
    }

    /// Re-marking an already-correct cell never consumes guesses.
    #[test]
    fn prop_remarking_correct_cell_is_guess_free(
        solution in solution_strategy(5),
        repeats in 1usize..10,
    ) {
        // Force one known-correct cell.
        let mut solution = solution;
        solution[12] = 1;
        let mut state = PuzzleState::from_record(&record(5, solution), 5).unwrap();

        for _ in 0..=repeats {
            prop_assert_eq!(state.apply_move(2, 2), MoveOutcome::Correct);
            prop_assert_eq!(state.flatten()[12], 1);
            prop_assert_eq!(state.guesses(), 0);
        }
    }
}
