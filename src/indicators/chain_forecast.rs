//! # Recursive Chain Forecaster
//!
//! Branching scenario forecast built from the top harmonics of the score
//! spectrum. Branches share the same starting harmonics and diverge purely
//! through uniform phase jitter injected between steps; the random source
//! is caller-supplied so tests can seed it.
//!
//! ## Parameters
//! - **harmonics**: components summed per step (default: 5)
//! - **branches**: independent forecast branches (default: 3)
//! - **steps**: iterations per branch (default: 3)
//! - **jitter**: phase perturbation half-range in radians (default: 0.1)

use crate::utilities::spectrum::{harmonic_at, mean_centered, rfft, top_bins};
use rand::Rng;
use serde::Serialize;
use std::f64::consts::TAU;

/// Minimum history length before branches are produced.
const MIN_ROUNDS: usize = 10;

#[derive(Debug, Clone)]
pub struct ChainForecastParams {
    pub harmonics: Option<usize>,
    pub branches: Option<usize>,
    pub steps: Option<usize>,
    pub jitter: Option<f64>,
}

impl Default for ChainForecastParams {
    fn default() -> Self {
        Self {
            harmonics: Some(5),
            branches: Some(3),
            steps: Some(3),
            jitter: Some(0.1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChainForecastInput<'a> {
    pub scores: &'a [f64],
    pub params: ChainForecastParams,
}

impl<'a> ChainForecastInput<'a> {
    pub fn new(scores: &'a [f64], params: ChainForecastParams) -> Self {
        Self { scores, params }
    }

    pub fn with_default_params(scores: &'a [f64]) -> Self {
        Self {
            scores,
            params: ChainForecastParams::default(),
        }
    }

    #[inline]
    fn get_harmonics(&self) -> usize {
        self.params.harmonics.unwrap_or(5)
    }

    #[inline]
    fn get_branches(&self) -> usize {
        self.params.branches.unwrap_or(3)
    }

    #[inline]
    fn get_steps(&self) -> usize {
        self.params.steps.unwrap_or(3)
    }

    #[inline]
    fn get_jitter(&self) -> f64 {
        self.params.jitter.unwrap_or(0.1)
    }
}

/// Categorical label of a forecast step's score estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChainLabel {
    PinkSpike,
    PurpleStable,
    NeutralDrift,
    BluePullback,
}

impl ChainLabel {
    pub fn from_value(value: f64) -> Self {
        if value >= 1.5 {
            ChainLabel::PinkSpike
        } else if value >= 0.5 {
            ChainLabel::PurpleStable
        } else if value < 0.0 {
            ChainLabel::BluePullback
        } else {
            ChainLabel::NeutralDrift
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChainLabel::PinkSpike => "Pink-Spike",
            ChainLabel::PurpleStable => "Purple-Stable",
            ChainLabel::NeutralDrift => "Neutral-Drift",
            ChainLabel::BluePullback => "Blue-Pullback",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChainStep {
    pub value: f64,
    pub label: ChainLabel,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChainForecastOutput {
    /// One step sequence per branch. Empty below the minimum history.
    pub branches: Vec<Vec<ChainStep>>,
}

/// Runs the branching forecast. Fewer than 10 rounds yields an empty
/// result, not an error.
pub fn chain_forecast<R: Rng + ?Sized>(
    input: &ChainForecastInput,
    rng: &mut R,
) -> ChainForecastOutput {
    let scores = input.scores;
    let n = scores.len();
    if n < MIN_ROUNDS {
        return ChainForecastOutput::default();
    }

    let spectrum = rfft(&mean_centered(scores));
    let bins = top_bins(&spectrum, input.get_harmonics());
    let base: Vec<_> = bins.iter().map(|&b| harmonic_at(&spectrum, n, b)).collect();
    if base.is_empty() {
        return ChainForecastOutput::default();
    }

    let jitter = input.get_jitter();
    let steps = input.get_steps();
    let mut branches = Vec::with_capacity(input.get_branches());
    for _ in 0..input.get_branches() {
        let mut harmonics = base.clone();
        // Private running history; only its length feeds the next t.
        let mut history_len = n;
        let mut branch = Vec::with_capacity(steps);
        for _ in 0..steps {
            let t = history_len as f64;
            let value = harmonics
                .iter()
                .map(|h| h.amplitude * (TAU * h.frequency * t + h.phase).sin())
                .sum::<f64>()
                / harmonics.len() as f64;
            history_len += 1;
            branch.push(ChainStep {
                value,
                label: ChainLabel::from_value(value),
            });
            for h in harmonics.iter_mut() {
                h.phase += rng.gen_range(-jitter..=jitter);
            }
        }
        branches.push(branch);
    }

    ChainForecastOutput { branches }
}
