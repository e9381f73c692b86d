//! Reproduction of a population from its fitness values.
//!
//! The trainer depends only on the [`EvolutionEngine`] trait; the built-in
//! [`GeneticEngine`] (tournament selection, elitism, uniform crossover,
//! weight mutation) is one interchangeable implementation.

#![allow(clippy::cast_precision_loss)]

use crate::evo::genome::{Genome, MutationConfig};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The capability the trainer delegates reproduction to.
///
/// The engine reads fitness values and produces the successor population; it
/// never sees puzzle state and the trainer never sees its internals.
pub trait EvolutionEngine {
    /// Produce the next generation from the current one and its fitness.
    fn next_generation<R: Rng>(
        &self,
        population: &[Genome],
        fitness: &[f64],
        rng: &mut R,
    ) -> Vec<Genome>;
}

/// Configuration for the built-in engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Individuals competing in each selection tournament.
    pub tournament_size: usize,
    /// Top individuals copied unchanged into the next generation.
    pub elite_count: usize,
    /// Probability that an offspring is produced by crossover rather than
    /// cloning its first parent.
    pub crossover_rate: f64,
    /// Weight mutation applied to every non-elite offspring.
    pub mutation: MutationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tournament_size: 5,
            elite_count: 2,
            crossover_rate: 0.75,
            mutation: MutationConfig::default(),
        }
    }
}

/// Tournament-selection engine with elitism.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneticEngine {
    config: EngineConfig,
}

impl GeneticEngine {
    /// Create an engine with the given configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl EvolutionEngine for GeneticEngine {
    fn next_generation<R: Rng>(
        &self,
        population: &[Genome],
        fitness: &[f64],
        rng: &mut R,
    ) -> Vec<Genome> {
        let target = population.len();
        if target == 0 {
            return Vec::new();
        }

        let mut next = Vec::with_capacity(target);
        for &idx in &rank_by_fitness(fitness)[..self.config.elite_count.min(target)] {
            next.push(population[idx].clone());
        }

        while next.len() < target {
            let p1 = tournament_pick(fitness, self.config.tournament_size, rng);
            let mut child = if rng.gen_bool(self.config.crossover_rate) {
                let p2 = tournament_pick(fitness, self.config.tournament_size, rng);
                population[p1].crossover(&population[p2], rng)
            } else {
                population[p1].clone()
            };
            child.mutate(&self.config.mutation, rng);
            next.push(child);
        }
        next
    }
}

/// Indices sorted by descending fitness.
fn rank_by_fitness(fitness: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..fitness.len()).collect();
    indices.sort_by(|&a, &b| {
        fitness[b]
            .partial_cmp(&fitness[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}

/// Index of the best among `k` uniformly drawn individuals.
fn tournament_pick<R: Rng>(fitness: &[f64], k: usize, rng: &mut R) -> usize {
    let len = fitness.len();
    let mut best = rng.gen_range(0..len);
    for _ in 1..k.clamp(1, len) {
        let challenger = rng.gen_range(0..len);
        if fitness[challenger] > fitness[best] {
            best = challenger;
        }
    }
    best
}

/// Fitness summary of one generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopulationStats {
    /// Highest fitness.
    pub best: f64,
    /// Mean fitness.
    pub mean: f64,
    /// Standard deviation of fitness.
    pub std_dev: f64,
}

impl PopulationStats {
    /// Summarize a fitness vector.
    #[must_use]
    pub fn from_fitness(fitness: &[f64]) -> Self {
        if fitness.is_empty() {
            return Self::default();
        }
        let n = fitness.len() as f64;
        let mean = fitness.iter().sum::<f64>() / n;
        let best = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = fitness.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;
        Self {
            best,
            mean,
            std_dev: variance.sqrt(),
        }
    }
}
