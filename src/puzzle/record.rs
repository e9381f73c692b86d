//! Immutable puzzle records and the repository that loads them.

use crate::error::PuzzleError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One nonogram instance as stored in a repository file.
///
/// `combined` packs the row and column clues, zero-padded to a fixed width of
/// `2 * size * size`, in the order the decision network consumes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleRecord {
    /// Unique identifier within the repository file.
    pub id: u32,
    /// Row clues, one run-length sequence per row.
    #[serde(rename = "tipsX")]
    pub tips_x: Vec<u32>,
    /// Column clues, one run-length sequence per column.
    #[serde(rename = "tipsY")]
    pub tips_y: Vec<u32>,
    /// Row and column clues packed and zero-padded to `2 * size * size`.
    pub combined: Vec<u32>,
    /// Row-major solution cells, each 0 or 1, length `size * size`.
    pub solution: Vec<u8>,
}

impl PuzzleRecord {
    /// Check that the packed clue and solution vectors match `size`.
    ///
    /// # Errors
    ///
    /// Returns [`PuzzleError::ClueLengthMismatch`] or
    /// [`PuzzleError::SolutionLengthMismatch`] on a malformed record.
    pub fn validate(&self, size: usize) -> Result<(), PuzzleError> {
        let cells = size * size;
        if self.combined.len() != 2 * cells {
            return Err(PuzzleError::ClueLengthMismatch {
                puzzle: self.id,
                expected: 2 * cells,
                actual: self.combined.len(),
            });
        }
        if self.solution.len() != cells {
            return Err(PuzzleError::SolutionLengthMismatch {
                puzzle: self.id,
                expected: cells,
                actual: self.solution.len(),
            });
        }
        Ok(())
    }
}

/// A collection of puzzle records of one size.
///
/// The repository is an explicit value with an injected random source, so
/// puzzle selection is reproducible under a seeded RNG.
#[derive(Debug, Clone)]
pub struct PuzzleRepository {
    size: usize,
    records: Vec<PuzzleRecord>,
}

impl PuzzleRepository {
    /// Load a repository from a JSON file containing an array of records.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// contains no records.
    pub fn load(path: &Path, size: usize) -> Result<Self, PuzzleError> {
        let data = fs::read_to_string(path)?;
        let records: Vec<PuzzleRecord> = serde_json::from_str(&data)?;
        Self::from_records(records, size)
    }

    /// Build a repository from in-memory records.
    ///
    /// # Errors
    ///
    /// Returns [`PuzzleError::EmptyRepository`] if `records` is empty.
    pub fn from_records(records: Vec<PuzzleRecord>, size: usize) -> Result<Self, PuzzleError> {
        if records.is_empty() {
            return Err(PuzzleError::EmptyRepository { size });
        }
        Ok(Self { size, records })
    }

    /// Conventional file path for a repository of the given size.
    #[must_use]
    pub fn default_path(dir: &Path, size: usize) -> PathBuf {
        dir.join(format!("{size}x{size}.json"))
    }

    /// Select one record uniformly at random.
    #[must_use]
    pub fn choose<R: Rng>(&self, rng: &mut R) -> &PuzzleRecord {
        &self.records[rng.gen_range(0..self.records.len())]
    }

    /// Grid size of every puzzle in this repository.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the repository holds no records (never true after load).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over all records.
    pub fn iter(&self) -> impl Iterator<Item = &PuzzleRecord> {
        self.records.iter()
    }
}
