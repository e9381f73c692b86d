//! Evolutionary training of puzzle-solving genomes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        Training Loop (trainer)      │
//! ├─────────────────────────────────────┤
//! │   Reproduction Engine (engine)      │
//! ├─────────────────────────────────────┤
//! │ Evaluation Protocol (evaluator) ×   │
//! │ Fitness Policy (fitness)            │
//! ├─────────────────────────────────────┤
//! │  Checkpoint Store (persistence)     │
//! └─────────────────────────────────────┘
//! ```
//!
//! The trainer sees genomes only through the [`Network`] activation
//! capability and the engine only through [`EvolutionEngine`], so both the
//! decision-function representation and the reproduction mechanics are
//! swappable.

mod engine;
mod evaluator;
mod fitness;
mod genome;
mod persistence;
mod trainer;

pub use engine::{EngineConfig, EvolutionEngine, GeneticEngine, PopulationStats};
pub use evaluator::{
    CancelToken, EvalConfig, EvalError, evaluate_generation, evaluate_genome, play_puzzle,
};
pub use fitness::{CoordEncoding, FitnessPolicy, Traversal};
pub use genome::{Genome, MutationConfig, Network};
pub use persistence::{BestGenome, Checkpoint, CheckpointStore};
pub use trainer::{
    GenerationStats, Trainer, TrainerConfig, TrainingError, TrainingOutcome, TrainingReport,
};
