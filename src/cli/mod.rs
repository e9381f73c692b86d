//! CLI command implementations for Nonevo.

pub(crate) mod run;
pub(crate) mod train;
pub(crate) mod validate;

use clap::ValueEnum;
use nonevo::evo::{EvalError, FitnessPolicy, TrainingError};
use nonevo::PuzzleError;
use std::error::Error;
use std::fmt;

/// Fitness policy selector for the `train` and `run` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum PolicyArg {
    /// Per-cell protocol with grid feedback.
    Sequential,
    /// One activation on the clues, one output per cell.
    SingleShot,
}

impl From<PolicyArg> for FitnessPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Sequential => Self::Sequential,
            PolicyArg::SingleShot => Self::SingleShot,
        }
    }
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<TrainingError> for CliError {
    fn from(e: TrainingError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<PuzzleError> for CliError {
    fn from(e: PuzzleError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<EvalError> for CliError {
    fn from(e: EvalError) -> Self {
        Self::new(e.to_string())
    }
}
