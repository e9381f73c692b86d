//! Error types for puzzle loading and construction.

use std::fmt;
use std::io;

/// Errors raised while loading puzzle data or constructing a simulation.
///
/// Length mismatches are configuration errors: they fail the construction
/// call, not the whole run, so the caller may retry puzzle selection.
#[derive(Debug)]
pub enum PuzzleError {
    /// The packed clue vector does not have length `2 * size * size`.
    ClueLengthMismatch {
        /// Identifier of the offending puzzle record.
        puzzle: u32,
        /// Expected clue vector length.
        expected: usize,
        /// Actual clue vector length.
        actual: usize,
    },
    /// The solution vector does not have length `size * size`.
    SolutionLengthMismatch {
        /// Identifier of the offending puzzle record.
        puzzle: u32,
        /// Expected solution length.
        expected: usize,
        /// Actual solution length.
        actual: usize,
    },
    /// A repository file contained no records for the requested size.
    EmptyRepository {
        /// The requested puzzle size.
        size: usize,
    },
    /// Reading the repository file failed.
    Io(io::Error),
    /// The repository file is not valid JSON.
    Json(serde_json::Error),
}

impl fmt::Display for PuzzleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClueLengthMismatch {
                puzzle,
                expected,
                actual,
            } => write!(
                f,
                "puzzle {puzzle}: clue vector has {actual} entries, expected {expected}"
            ),
            Self::SolutionLengthMismatch {
                puzzle,
                expected,
                actual,
            } => write!(
                f,
                "puzzle {puzzle}: solution has {actual} cells, expected {expected}"
            ),
            Self::EmptyRepository { size } => {
                write!(f, "no {size}x{size} puzzles in repository")
            }
            Self::Io(e) => write!(f, "puzzle repository I/O error: {e}"),
            Self::Json(e) => write!(f, "puzzle repository parse error: {e}"),
        }
    }
}

impl std::error::Error for PuzzleError {}

impl From<io::Error> for PuzzleError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for PuzzleError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
