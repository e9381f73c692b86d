//! Feedforward-network genome: the evolvable decision function.
//!
//! A genome is a fixed-topology dense network (inputs, optional tanh hidden
//! layer, sigmoid outputs) whose weights and biases are the evolved
//! parameters. The trainer and evaluator never depend on this concrete type;
//! they see only the [`Network`] capability.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// The capability the evaluation protocol consumes: a pure function of the
/// genome's parameters and the given input vector.
///
/// Implementations must return an empty vector when the input length does
/// not match the genome's configured width, so the evaluator can isolate the
/// failure instead of panicking mid-generation.
pub trait Network {
    /// Feed `inputs` forward and return one output per configured output.
    fn activate(&self, inputs: &[f64]) -> Vec<f64>;
}

/// Configuration for weight mutation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Probability of perturbing each weight or bias.
    pub perturb_rate: f64,
    /// Half-width of the uniform perturbation applied to a weight.
    pub perturb_power: f64,
    /// Probability of replacing a weight with a fresh random value.
    pub replace_rate: f64,
    /// Weights are clamped to `[-weight_limit, weight_limit]`.
    pub weight_limit: f64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            perturb_rate: 0.3,
            perturb_power: 0.8,
            replace_rate: 0.05,
            weight_limit: 5.0,
        }
    }
}

/// A candidate solver: dense feedforward weights subject to evolutionary
/// selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// Input vector width this genome was built for.
    pub input_count: usize,
    /// Hidden layer width; zero means direct input-to-output connections.
    pub hidden_count: usize,
    /// Output vector width.
    pub output_count: usize,
    /// Input-to-hidden weights, row-major `hidden_count x input_count`.
    /// Empty when there is no hidden layer.
    pub input_weights: Vec<f64>,
    /// Hidden-layer biases.
    pub hidden_biases: Vec<f64>,
    /// Weights feeding the output layer, row-major. The inner dimension is
    /// `hidden_count` when a hidden layer exists, otherwise `input_count`.
    pub output_weights: Vec<f64>,
    /// Output-layer biases.
    pub output_biases: Vec<f64>,
}

impl Genome {
    /// Create a genome with uniformly random weights in `[-1, 1]`.
    #[must_use]
    pub fn random<R: Rng>(
        rng: &mut R,
        input_count: usize,
        hidden_count: usize,
        output_count: usize,
    ) -> Self {
        let fan_in = if hidden_count == 0 {
            input_count
        } else {
            hidden_count
        };
        Self {
            input_count,
            hidden_count,
            output_count,
            input_weights: random_weights(rng, hidden_count * input_count),
            hidden_biases: random_weights(rng, hidden_count),
            output_weights: random_weights(rng, output_count * fan_in),
            output_biases: random_weights(rng, output_count),
        }
    }

    /// Total number of evolvable parameters.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.input_weights.len()
            + self.hidden_biases.len()
            + self.output_weights.len()
            + self.output_biases.len()
    }

    /// Whether `other` has the same topology, so per-weight crossover is
    /// meaningful.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.input_count == other.input_count
            && self.hidden_count == other.hidden_count
            && self.output_count == other.output_count
    }

    /// Perturb weights in place.
    pub fn mutate<R: Rng>(&mut self, config: &MutationConfig, rng: &mut R) {
        mutate_weights(&mut self.input_weights, config, rng);
        mutate_weights(&mut self.hidden_biases, config, rng);
        mutate_weights(&mut self.output_weights, config, rng);
        mutate_weights(&mut self.output_biases, config, rng);
    }

    /// Whether the weight and bias vectors match the declared topology.
    ///
    /// False for genomes deserialized from tampered or corrupt artifacts;
    /// [`Network::activate`] treats such genomes as failed evaluations.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let fan_in = if self.hidden_count == 0 {
            self.input_count
        } else {
            self.hidden_count
        };
        self.input_weights.len() == self.hidden_count * self.input_count
            && self.hidden_biases.len() == self.hidden_count
            && self.output_weights.len() == self.output_count * fan_in
            && self.output_biases.len() == self.output_count
    }

    /// Uniform per-weight crossover with another parent.
    ///
    /// Each weight is taken from either parent with equal probability. If
    /// the parents disagree on topology the child is a clone of `self`.
    #[must_use]
    pub fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        if !self.same_shape(other) {
            return self.clone();
        }
        Self {
            input_count: self.input_count,
            hidden_count: self.hidden_count,
            output_count: self.output_count,
            input_weights: mix(&self.input_weights, &other.input_weights, rng),
            hidden_biases: mix(&self.hidden_biases, &other.hidden_biases, rng),
            output_weights: mix(&self.output_weights, &other.output_weights, rng),
            output_biases: mix(&self.output_biases, &other.output_biases, rng),
        }
    }
}

impl Network for Genome {
    fn activate(&self, inputs: &[f64]) -> Vec<f64> {
        if inputs.len() != self.input_count || !self.is_consistent() {
            return Vec::new();
        }
        if self.hidden_count == 0 {
            let mut out = dense(inputs, &self.output_weights, &self.output_biases);
            for v in &mut out {
                *v = sigmoid(*v);
            }
            return out;
        }
        let mut hidden = dense(inputs, &self.input_weights, &self.hidden_biases);
        for v in &mut hidden {
            *v = v.tanh();
        }
        let mut out = dense(&hidden, &self.output_weights, &self.output_biases);
        for v in &mut out {
            *v = sigmoid(*v);
        }
        out
    }
}

fn random_weights<R: Rng>(rng: &mut R, count: usize) -> Vec<f64> {
    (0..count).map(|_| rng.gen_range(-1.0..=1.0)).collect()
}

fn mutate_weights<R: Rng>(weights: &mut [f64], config: &MutationConfig, rng: &mut R) {
    for w in weights {
        if rng.gen_bool(config.replace_rate) {
            *w = rng.gen_range(-1.0..=1.0);
        } else if rng.gen_bool(config.perturb_rate) {
            *w += rng.gen_range(-config.perturb_power..=config.perturb_power);
            *w = w.clamp(-config.weight_limit, config.weight_limit);
        }
    }
}

fn mix<R: Rng>(a: &[f64], b: &[f64], rng: &mut R) -> Vec<f64> {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| if rng.gen_bool(0.5) { x } else { y })
        .collect()
}

/// Row-major dense layer: `weights` has one row of `inputs.len()` entries
/// per bias.
fn dense(inputs: &[f64], weights: &[f64], biases: &[f64]) -> Vec<f64> {
    biases
        .iter()
        .enumerate()
        .map(|(row, &bias)| {
            let offset = row * inputs.len();
            let sum: f64 = inputs
                .iter()
                .zip(&weights[offset..offset + inputs.len()])
                .map(|(&i, &w)| i * w)
                .sum();
            sum + bias
        })
        .collect()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
