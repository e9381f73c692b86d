//! The generational training loop.
//!
//! Each generation draws one puzzle template shared by every genome (so
//! fitness comparisons within the generation are fair), evaluates the
//! population in parallel, hands reproduction to the evolution engine, and
//! tracks the fitness-threshold streak and the best genome seen so far.
//! Interval checkpoints and the best-genome slot make runs resumable;
//! failing to write either aborts the run rather than continuing with
//! silently compromised resumability.

#![allow(clippy::print_stderr)]

use crate::error::PuzzleError;
use crate::evo::engine::{EvolutionEngine, PopulationStats};
use crate::evo::evaluator::{CancelToken, EvalConfig, evaluate_generation};
use crate::evo::genome::Genome;
use crate::evo::persistence::{BestGenome, Checkpoint, CheckpointStore};
use crate::puzzle::{DEFAULT_MAX_GUESSES, PuzzleRepository, PuzzleState};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

/// Attempts at drawing a well-formed puzzle record per generation.
const PUZZLE_DRAW_ATTEMPTS: u32 = 3;

/// Configuration consumed by [`Trainer`] at construction.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Puzzle grid size.
    pub size: usize,
    /// Number of genomes per generation.
    pub population_size: usize,
    /// Hidden-layer width of fresh genomes (zero for direct connections).
    pub hidden_count: usize,
    /// Generation limit.
    pub max_generations: u32,
    /// Winner fitness at or above this value counts toward the streak.
    pub fitness_threshold: f64,
    /// Consecutive threshold-meeting generations required to stop.
    pub consecutive_threshold: u32,
    /// Wrong guesses allowed per evaluation.
    pub max_guesses: u32,
    /// Checkpoint every this many generations (zero disables intervals).
    pub checkpoint_interval: u32,
    /// Directory holding checkpoint artifacts and the best-genome slot.
    pub checkpoint_dir: PathBuf,
    /// Directory holding puzzle repository files.
    pub puzzle_dir: PathBuf,
    /// Base RNG seed; each generation derives its own stream from it.
    pub seed: u64,
    /// Continue from the latest checkpoint instead of a fresh population.
    pub resume: bool,
    /// Evaluation protocol settings.
    pub eval: EvalConfig,
    /// Print per-generation progress to stderr.
    pub verbose: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            size: 5,
            population_size: 150,
            hidden_count: 0,
            max_generations: 1000,
            fitness_threshold: 1000.0,
            consecutive_threshold: 10,
            max_guesses: DEFAULT_MAX_GUESSES,
            checkpoint_interval: 5,
            checkpoint_dir: PathBuf::from("checkpoints"),
            puzzle_dir: PathBuf::from("puzzles"),
            seed: 42,
            resume: false,
            eval: EvalConfig::default(),
            verbose: true,
        }
    }
}

/// Why a training run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingOutcome {
    /// The winner met the fitness threshold for the configured number of
    /// consecutive generations.
    ThresholdMet {
        /// Generation at which the streak completed.
        generation: u32,
    },
    /// The generation limit was reached first.
    MaxGenerationsReached,
    /// Cancellation was requested between generations.
    Cancelled {
        /// Last fully completed generation.
        generation: u32,
    },
}

/// Summary of one evaluated generation.
#[derive(Debug, Clone, Copy)]
pub struct GenerationStats {
    /// Generation ordinal.
    pub generation: u32,
    /// Identifier of the puzzle shared by this generation.
    pub puzzle_id: u32,
    /// Winner fitness.
    pub best_fitness: f64,
    /// Mean fitness.
    pub mean_fitness: f64,
    /// Fitness standard deviation.
    pub fitness_std: f64,
}

/// Result of a completed (or cancelled) training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// How the run ended.
    pub outcome: TrainingOutcome,
    /// Best fitness recorded across the run.
    pub best_fitness: f64,
    /// Generation in which the best was found.
    pub best_generation: u32,
    /// Per-generation statistics.
    pub generations: Vec<GenerationStats>,
    /// Wall-clock duration in seconds.
    pub elapsed_seconds: f64,
}

/// Fatal training failures, labelled by the stage that failed.
#[derive(Debug)]
pub enum TrainingError {
    /// Puzzle repository loading or state construction failed.
    Puzzle(PuzzleError),
    /// A checkpoint or best-genome write/read failed. Always fatal:
    /// continuing would make resume semantics unreliable.
    Checkpoint(io::Error),
    /// The population is empty (bad configuration or corrupt checkpoint).
    EmptyPopulation,
}

impl fmt::Display for TrainingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Puzzle(e) => write!(f, "puzzle construction failed: {e}"),
            Self::Checkpoint(e) => write!(f, "checkpoint I/O failed, aborting run: {e}"),
            Self::EmptyPopulation => write!(f, "generation evaluation loop: empty population"),
        }
    }
}

impl std::error::Error for TrainingError {}

impl From<PuzzleError> for TrainingError {
    fn from(e: PuzzleError) -> Self {
        Self::Puzzle(e)
    }
}

/// Orchestrates generations against an evolution engine.
#[derive(Debug)]
pub struct Trainer<E: EvolutionEngine> {
    config: TrainerConfig,
    engine: E,
    repository: PuzzleRepository,
    store: CheckpointStore,
}

impl<E: EvolutionEngine> Trainer<E> {
    /// Build a trainer, loading the puzzle repository for the configured
    /// size and opening the checkpoint store.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository file or checkpoint directory is
    /// unusable.
    pub fn new(config: TrainerConfig, engine: E) -> Result<Self, TrainingError> {
        let path = PuzzleRepository::default_path(&config.puzzle_dir, config.size);
        let repository = PuzzleRepository::load(&path, config.size)?;
        Self::with_repository(config, engine, repository)
    }

    /// Build a trainer around an already-loaded repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint directory cannot be opened.
    pub fn with_repository(
        config: TrainerConfig,
        engine: E,
        repository: PuzzleRepository,
    ) -> Result<Self, TrainingError> {
        let store = CheckpointStore::open(&config.checkpoint_dir)
            .map_err(TrainingError::Checkpoint)?;
        Ok(Self {
            config,
            engine,
            repository,
            store,
        })
    }

    /// The store this trainer persists to.
    #[must_use]
    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Run to termination.
    ///
    /// # Errors
    ///
    /// Returns an error on any fatal stage failure; see [`TrainingError`].
    pub fn run(&self, cancel: &CancelToken) -> Result<TrainingReport, TrainingError> {
        self.run_with_observer(cancel, |_| {})
    }

    /// Run to termination, invoking `observer` after every evaluated
    /// generation (progress bars, logging).
    ///
    /// # Errors
    ///
    /// Returns an error on any fatal stage failure; see [`TrainingError`].
    pub fn run_with_observer<F>(
        &self,
        cancel: &CancelToken,
        mut observer: F,
    ) -> Result<TrainingReport, TrainingError>
    where
        F: FnMut(&GenerationStats),
    {
        let start = Instant::now();
        let (mut population, mut generation, base_seed) = self.initial_population()?;
        if population.is_empty() {
            return Err(TrainingError::EmptyPopulation);
        }

        let mut best: Option<BestGenome> = if self.config.resume {
            self.store.load_best().map_err(TrainingError::Checkpoint)?
        } else {
            None
        };
        let mut threshold_count = 0u32;
        let mut stats_log = Vec::new();

        let outcome = loop {
            if generation >= self.config.max_generations {
                break TrainingOutcome::MaxGenerationsReached;
            }
            if cancel.is_cancelled() {
                break TrainingOutcome::Cancelled { generation };
            }

            let mut rng = self.generation_rng(base_seed, generation);
            let template = self.draw_template(&mut rng)?;
            let fitness =
                evaluate_generation(&population, &template, &self.config.eval, cancel);
            if cancel.is_cancelled() {
                // Partially evaluated fitness is discarded.
                break TrainingOutcome::Cancelled { generation };
            }

            let (winner_idx, winner_fitness) = argmax(&fitness);
            let stats = PopulationStats::from_fitness(&fitness);
            let gen_stats = GenerationStats {
                generation,
                puzzle_id: template.puzzle_id(),
                best_fitness: winner_fitness,
                mean_fitness: stats.mean,
                fitness_std: stats.std_dev,
            };
            stats_log.push(gen_stats);
            observer(&gen_stats);
            if self.config.verbose {
                eprintln!(
                    "Gen {:>5}: puzzle={} best={:.1} mean={:.1} std={:.1}",
                    generation,
                    template.puzzle_id(),
                    winner_fitness,
                    stats.mean,
                    stats.std_dev
                );
            }

            let winner = population[winner_idx].clone();

            // Best tracking precedes the threshold streak so the streak's
            // final winner is also the recorded best.
            if best.as_ref().is_none_or(|b| winner_fitness > b.fitness) {
                let record = BestGenome {
                    genome: winner.clone(),
                    fitness: winner_fitness,
                    generation,
                };
                self.store
                    .save_best(&record)
                    .map_err(TrainingError::Checkpoint)?;
                if self.config.verbose {
                    eprintln!("  New best fitness {winner_fitness:.1} at generation {generation}");
                }
                best = Some(record);
            }

            // The checkpoint pairs the evaluated population with its own
            // fitness vector; resume re-enters at this generation and
            // replays it from the same RNG stream.
            if self.config.checkpoint_interval > 0
                && (generation + 1).is_multiple_of(self.config.checkpoint_interval)
            {
                self.store
                    .save(&Checkpoint {
                        generation,
                        population: population.clone(),
                        fitness: fitness.clone(),
                        best_fitness: best.as_ref().map_or(0.0, |b| b.fitness),
                        seed: base_seed,
                    })
                    .map_err(TrainingError::Checkpoint)?;
            }

            if winner_fitness >= self.config.fitness_threshold {
                threshold_count += 1;
                if threshold_count >= self.config.consecutive_threshold {
                    self.store
                        .save_best(&BestGenome {
                            genome: winner,
                            fitness: winner_fitness,
                            generation,
                        })
                        .map_err(TrainingError::Checkpoint)?;
                    break TrainingOutcome::ThresholdMet { generation };
                }
            } else {
                threshold_count = 0;
            }

            let next = self.engine.next_generation(&population, &fitness, &mut rng);
            if next.is_empty() {
                return Err(TrainingError::EmptyPopulation);
            }

            population = next;
            generation += 1;
        };

        if let Some(record) = &best {
            self.store
                .save_best(record)
                .map_err(TrainingError::Checkpoint)?;
        }

        Ok(TrainingReport {
            outcome,
            best_fitness: best.as_ref().map_or(0.0, |b| b.fitness),
            best_generation: best.as_ref().map_or(0, |b| b.generation),
            generations: stats_log,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        })
    }

    /// Fresh random population, or the latest checkpoint when resuming.
    ///
    /// Returns the population, the generation to (re-)enter, and the RNG
    /// base seed. A resumed run takes the seed from the checkpoint, not the
    /// configuration, so it continues the original run's random streams even
    /// when the configured seed differs (the CLI defaults it to the clock).
    fn initial_population(&self) -> Result<(Vec<Genome>, u32, u64), TrainingError> {
        if self.config.resume
            && let Some(checkpoint) =
                self.store.load_latest().map_err(TrainingError::Checkpoint)?
        {
            if self.config.verbose {
                eprintln!(
                    "Resuming from checkpoint at generation {} (seed {})",
                    checkpoint.generation, checkpoint.seed
                );
            }
            return Ok((checkpoint.population, checkpoint.generation, checkpoint.seed));
        }

        let inputs = self.config.eval.input_width(self.config.size);
        let outputs = self.config.eval.output_width(self.config.size);
        let mut rng = SmallRng::seed_from_u64(self.config.seed);
        let population = (0..self.config.population_size)
            .map(|_| Genome::random(&mut rng, inputs, self.config.hidden_count, outputs))
            .collect();
        Ok((population, 0, self.config.seed))
    }

    /// Deterministic per-generation RNG derived from the base seed, so a
    /// resumed run replays the same puzzle draws and reproduction choices.
    fn generation_rng(&self, base: u64, generation: u32) -> SmallRng {
        let stream =
            base.wrapping_add(u64::from(generation).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        SmallRng::seed_from_u64(stream)
    }

    /// Draw the generation's shared template, retrying selection a few
    /// times if a malformed record is hit.
    fn draw_template(&self, rng: &mut SmallRng) -> Result<PuzzleState, TrainingError> {
        let mut last_err = None;
        for _ in 0..PUZZLE_DRAW_ATTEMPTS {
            match PuzzleState::sample(&self.repository, rng) {
                Ok(state) => return Ok(state.with_max_guesses(self.config.max_guesses)),
                Err(e) => {
                    if self.config.verbose {
                        eprintln!("Warning: skipping malformed puzzle record: {e}");
                    }
                    last_err = Some(e);
                }
            }
        }
        Err(TrainingError::Puzzle(last_err.unwrap_or(
            PuzzleError::EmptyRepository {
                size: self.config.size,
            },
        )))
    }
}

/// Index and value of the maximum fitness.
fn argmax(fitness: &[f64]) -> (usize, f64) {
    fitness
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or((0, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evo::engine::GeneticEngine;
    use crate::evo::fitness::FitnessPolicy;
    use crate::puzzle::PuzzleRecord;
    use tempfile::tempdir;

    fn plus_repository() -> PuzzleRepository {
        let record = PuzzleRecord {
            id: 1,
            tips_x: Vec::new(),
            tips_y: Vec::new(),
            combined: vec![0; 50],
            solution: vec![
                0, 0, 0, 0, 0, 0, 1, 1, 1, 0, 1, 1, 1, 1, 1, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0,
            ],
        };
        PuzzleRepository::from_records(vec![record], 5).unwrap()
    }

    /// Eight distinct records, so puzzle draws expose RNG divergence.
    fn varied_repository() -> PuzzleRepository {
        let records: Vec<PuzzleRecord> = (0u8..8)
            .map(|i| {
                let mut solution = vec![0u8; 25];
                solution[usize::from(i) * 3] = 1;
                PuzzleRecord {
                    id: u32::from(i),
                    tips_x: Vec::new(),
                    tips_y: Vec::new(),
                    combined: vec![0; 50],
                    solution,
                }
            })
            .collect();
        PuzzleRepository::from_records(records, 5).unwrap()
    }

    fn small_config(dir: &std::path::Path) -> TrainerConfig {
        TrainerConfig {
            population_size: 8,
            max_generations: 4,
            checkpoint_interval: 2,
            checkpoint_dir: dir.to_path_buf(),
            verbose: false,
            eval: EvalConfig {
                policy: FitnessPolicy::SingleShot,
                ..EvalConfig::default()
            },
            ..TrainerConfig::default()
        }
    }

    #[test]
    fn test_run_reaches_generation_limit() {
        let dir = tempdir().unwrap();
        let trainer = Trainer::with_repository(
            small_config(dir.path()),
            GeneticEngine::default(),
            plus_repository(),
        )
        .unwrap();

        let report = trainer.run(&CancelToken::new()).unwrap();
        assert_eq!(report.outcome, TrainingOutcome::MaxGenerationsReached);
        assert_eq!(report.generations.len(), 4);
        // Every second evaluated generation is checkpointed.
        assert_eq!(trainer.store().ordinals().unwrap(), vec![1, 3]);
        assert!(trainer.store().load_best().unwrap().is_some());
    }

    #[test]
    fn test_resume_reenters_checkpointed_generation() {
        let dir = tempdir().unwrap();
        let config = small_config(dir.path());
        let trainer = Trainer::with_repository(
            config.clone(),
            GeneticEngine::default(),
            plus_repository(),
        )
        .unwrap();
        trainer.run(&CancelToken::new()).unwrap();

        let resumed = Trainer::with_repository(
            TrainerConfig {
                resume: true,
                max_generations: 6,
                ..config
            },
            GeneticEngine::default(),
            plus_repository(),
        )
        .unwrap();
        let report = resumed.run(&CancelToken::new()).unwrap();

        // Latest checkpoint covered generation 3, so 3, 4 and 5 ran.
        assert_eq!(report.outcome, TrainingOutcome::MaxGenerationsReached);
        assert_eq!(report.generations.len(), 3);
        assert_eq!(report.generations[0].generation, 3);
    }

    #[test]
    fn test_checkpoint_pairs_population_with_its_fitness() {
        let dir = tempdir().unwrap();
        let config = TrainerConfig {
            checkpoint_interval: 1,
            ..small_config(dir.path())
        };
        let trainer =
            Trainer::with_repository(config, GeneticEngine::default(), plus_repository())
                .unwrap();
        trainer.run(&CancelToken::new()).unwrap();

        // The genome at the argmax of a checkpoint's fitness vector must be
        // the recorded best of that generation, not a reproduced offspring.
        let best = trainer.store().load_best().unwrap().unwrap();
        let checkpoint = trainer.store().load(best.generation).unwrap();
        let (winner_idx, winner_fitness) = argmax(&checkpoint.fitness);
        assert_eq!(checkpoint.population[winner_idx], best.genome);
        assert!((winner_fitness - best.fitness).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resume_follows_checkpoint_seed_not_config() {
        let dir = tempdir().unwrap();
        let config = TrainerConfig {
            seed: 7,
            ..small_config(dir.path())
        };

        let uninterrupted = Trainer::with_repository(
            TrainerConfig {
                max_generations: 6,
                checkpoint_dir: dir.path().join("full"),
                ..config.clone()
            },
            GeneticEngine::default(),
            varied_repository(),
        )
        .unwrap()
        .run(&CancelToken::new())
        .unwrap();

        let halted = Trainer::with_repository(
            config.clone(),
            GeneticEngine::default(),
            varied_repository(),
        )
        .unwrap();
        halted.run(&CancelToken::new()).unwrap();

        // Resume under a different configured seed; the stored seed governs.
        let resumed = Trainer::with_repository(
            TrainerConfig {
                resume: true,
                seed: 99,
                max_generations: 6,
                ..config
            },
            GeneticEngine::default(),
            varied_repository(),
        )
        .unwrap()
        .run(&CancelToken::new())
        .unwrap();

        assert_eq!(resumed.generations.len(), 3);
        for (replayed, original) in resumed.generations.iter().zip(&uninterrupted.generations[3..])
        {
            assert_eq!(replayed.generation, original.generation);
            assert_eq!(replayed.puzzle_id, original.puzzle_id);
            assert!((replayed.best_fitness - original.best_fitness).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_cancellation_stops_between_generations() {
        let dir = tempdir().unwrap();
        let trainer = Trainer::with_repository(
            small_config(dir.path()),
            GeneticEngine::default(),
            plus_repository(),
        )
        .unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let report = trainer.run(&cancel).unwrap();
        assert_eq!(report.outcome, TrainingOutcome::Cancelled { generation: 0 });
        assert!(report.generations.is_empty());
    }

    #[test]
    fn test_same_seed_reproduces_run() {
        let dir_a = tempdir().unwrap();
        let dir_b = tempdir().unwrap();

        let run = |dir: &std::path::Path| {
            let trainer = Trainer::with_repository(
                small_config(dir),
                GeneticEngine::default(),
                plus_repository(),
            )
            .unwrap();
            trainer.run(&CancelToken::new()).unwrap()
        };

        let a = run(dir_a.path());
        let b = run(dir_b.path());
        assert!((a.best_fitness - b.best_fitness).abs() < f64::EPSILON);
        for (x, y) in a.generations.iter().zip(&b.generations) {
            assert!((x.best_fitness - y.best_fitness).abs() < f64::EPSILON);
            assert!((x.mean_fitness - y.mean_fitness).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_argmax_picks_highest() {
        let (idx, value) = argmax(&[1.0, 5.0, 3.0]);
        assert_eq!(idx, 1);
        assert!((value - 5.0).abs() < f64::EPSILON);
        assert_eq!(argmax(&[]).0, 0);
    }
}
