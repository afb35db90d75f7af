//! # Multi-Harmonic Resonance Engine
//!
//! Extracts the top-K spectral components of the score series, measures
//! their pairwise phase alignment (the resonance matrix), aggregates it
//! into coherence/tension/entropy, and rolls the harmonics forward into a
//! short coupled forecast with a next-round energy classification.
//!
//! ## Parameters
//! - **top_k**: number of harmonics kept (default: 5)
//! - **forecast_len**: forward steps (default: 5)
//!
//! Requires at least 10 rounds; below that the engine yields no model.

use crate::utilities::helpers::{population_variance, shannon_entropy};
use crate::utilities::spectrum::{harmonic_at, mean_centered, rfft, top_bins, Harmonic};
use serde::Serialize;
use std::f64::consts::TAU;

/// Minimum history length before a resonance model is built.
const MIN_ROUNDS: usize = 10;

/// Samples inspected when estimating a harmonic's short-term frequency from
/// sign-change spacing.
const SIGN_SCAN: usize = 20;

#[derive(Debug, Clone)]
pub struct ResonanceParams {
    pub top_k: Option<usize>,
    pub forecast_len: Option<usize>,
}

impl Default for ResonanceParams {
    fn default() -> Self {
        Self {
            top_k: Some(5),
            forecast_len: Some(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResonanceInput<'a> {
    pub scores: &'a [f64],
    pub params: ResonanceParams,
}

impl<'a> ResonanceInput<'a> {
    pub fn new(scores: &'a [f64], params: ResonanceParams) -> Self {
        Self { scores, params }
    }

    pub fn with_default_params(scores: &'a [f64]) -> Self {
        Self {
            scores,
            params: ResonanceParams::default(),
        }
    }

    #[inline]
    fn get_top_k(&self) -> usize {
        self.params.top_k.unwrap_or(5)
    }

    #[inline]
    fn get_forecast_len(&self) -> usize {
        self.params.forecast_len.unwrap_or(5)
    }
}

/// Energy bucket for the next round, from `tanh(forecast[0])`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnergyBucket {
    PinkSurge,
    Purple,
    NeutralDrift,
    BluePullback,
    CollapseRisk,
}

impl EnergyBucket {
    pub fn label(self) -> &'static str {
        match self {
            EnergyBucket::PinkSurge => "Pink-Surge",
            EnergyBucket::Purple => "Purple",
            EnergyBucket::NeutralDrift => "Neutral-Drift",
            EnergyBucket::BluePullback => "Blue-Pullback",
            EnergyBucket::CollapseRisk => "Collapse-Risk",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResonanceOutput {
    /// Top-K components, strongest first.
    pub harmonics: Vec<Harmonic>,
    /// `matrix[i][j] = cos(phase_i - phase_j) * min(amp_i, amp_j)`, zero
    /// diagonal. Symmetric because cosine is even in the phase difference.
    pub matrix: Vec<Vec<f64>>,
    /// Matrix sum over `K * (K - 1)`.
    pub coherence: f64,
    /// Population variance of the top-K amplitudes.
    pub tension: f64,
    /// Shannon entropy of the normalized amplitude distribution.
    pub entropy: f64,
    /// Coupled multi-step forecast of the score estimate.
    pub forecast: Vec<f64>,
    /// `tanh(forecast[0])`, in (-1, 1).
    pub energy_index: f64,
    pub bucket: EnergyBucket,
    pub action: &'static str,
}

/// Short-term frequency estimate from sign-change spacing of the most
/// recent samples. With no usable gap between sign changes the estimate
/// falls back to 1, which leaves the extrapolated value unchanged.
fn estimate_frequency(series: &[f64]) -> f64 {
    let start = series.len().saturating_sub(SIGN_SCAN);
    let recent = &series[start..];
    let mut change_positions = Vec::new();
    for i in 1..recent.len() {
        if recent[i - 1] * recent[i] < 0.0 {
            change_positions.push(i);
        }
    }
    if change_positions.len() < 2 {
        return 1.0;
    }
    let gaps: Vec<f64> = change_positions
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64)
        .collect();
    let mean_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;
    if mean_gap <= 0.0 {
        return 1.0;
    }
    1.0 / (2.0 * mean_gap)
}

fn classify(energy: f64, tension: f64, entropy: f64) -> EnergyBucket {
    if energy > 0.8 {
        // Extreme bucket gated on a focused spectrum.
        if entropy <= 1.2 {
            EnergyBucket::PinkSurge
        } else {
            EnergyBucket::Purple
        }
    } else if energy > 0.4 {
        EnergyBucket::Purple
    } else if energy < -0.8 {
        // Extreme bucket gated on amplitude dispersion.
        if tension >= 0.3 {
            EnergyBucket::CollapseRisk
        } else {
            EnergyBucket::BluePullback
        }
    } else if energy < -0.4 {
        EnergyBucket::BluePullback
    } else {
        EnergyBucket::NeutralDrift
    }
}

fn suggest_action(bucket: EnergyBucket, coherent: bool) -> &'static str {
    match (bucket, coherent) {
        (EnergyBucket::PinkSurge, true) => "Strong entry — harmonics aligned",
        (EnergyBucket::PinkSurge, false) => "Scout entry — surge without alignment",
        (EnergyBucket::Purple, true) => "Steady entry window",
        (EnergyBucket::Purple, false) => "Scout cautiously",
        (EnergyBucket::NeutralDrift, _) => "Hold — no directional energy",
        (EnergyBucket::BluePullback, true) => "Stand down — aligned decline",
        (EnergyBucket::BluePullback, false) => "Stand down",
        (EnergyBucket::CollapseRisk, _) => "Stand down — collapse risk",
    }
}

/// Builds the resonance model, or None when fewer than 10 rounds exist.
pub fn resonance(input: &ResonanceInput) -> Option<ResonanceOutput> {
    let scores = input.scores;
    let n = scores.len();
    if n < MIN_ROUNDS {
        return None;
    }

    let spectrum = rfft(&mean_centered(scores));
    let bins = top_bins(&spectrum, input.get_top_k());
    let harmonics: Vec<Harmonic> = bins.iter().map(|&b| harmonic_at(&spectrum, n, b)).collect();
    let k = harmonics.len();
    if k == 0 {
        return None;
    }

    let mut matrix = vec![vec![0.0; k]; k];
    for i in 0..k {
        for j in 0..k {
            if i == j {
                continue;
            }
            matrix[i][j] = (harmonics[i].phase - harmonics[j].phase).cos()
                * harmonics[i].amplitude.min(harmonics[j].amplitude);
        }
    }

    let matrix_sum: f64 = matrix.iter().flatten().sum();
    let coherence = if k > 1 {
        matrix_sum / (k * (k - 1)) as f64
    } else {
        0.0
    };
    let amplitudes: Vec<f64> = harmonics.iter().map(|h| h.amplitude).collect();
    let tension = population_variance(&amplitudes);
    let entropy = shannon_entropy(&amplitudes);

    // Coupled forecast: every harmonic's running series starts as its own
    // reconstruction over the observed range, and all of them are extended
    // with each step's mean, so the components couple across steps.
    let mut series: Vec<Vec<f64>> = harmonics
        .iter()
        .map(|h| {
            (0..n)
                .map(|t| h.amplitude * (TAU * h.frequency * t as f64 + h.phase).sin())
                .collect()
        })
        .collect();

    let forecast_len = input.get_forecast_len();
    let mut forecast = Vec::with_capacity(forecast_len);
    for _ in 0..forecast_len {
        let mut step_sum = 0.0;
        for (i, s) in series.iter().enumerate() {
            let last = *s.last().unwrap_or(&0.0);
            let freq_estimate = estimate_frequency(s);
            let influence = if k > 1 {
                matrix[i].iter().sum::<f64>() / (k - 1) as f64
            } else {
                0.0
            };
            step_sum += last * (TAU * freq_estimate).cos() * (1.0 + influence);
        }
        let step_value = step_sum / k as f64;
        for s in series.iter_mut() {
            s.push(step_value);
        }
        forecast.push(step_value);
    }

    let energy_index = forecast.first().copied().unwrap_or(0.0).tanh();
    let bucket = classify(energy_index, tension, entropy);
    let action = suggest_action(bucket, coherence > 0.7);

    Some(ResonanceOutput {
        harmonics,
        matrix,
        coherence,
        tension,
        entropy,
        forecast,
        energy_index,
        bucket,
        action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn sample_scores(n: usize) -> Vec<f64> {
        (0..n)
            .map(|t| {
                let t = t as f64;
                (TAU * t / 8.0).sin() + 0.5 * (TAU * t / 3.0).sin() - 0.2
            })
            .collect()
    }

    #[test]
    fn test_below_minimum_rounds_yields_none() {
        let scores = vec![1.0; 9];
        assert!(resonance(&ResonanceInput::with_default_params(&scores)).is_none());
    }

    #[test]
    fn test_matrix_symmetric_with_zero_diagonal() {
        let scores = sample_scores(40);
        let out = resonance(&ResonanceInput::with_default_params(&scores)).unwrap();
        let k = out.harmonics.len();
        assert_eq!(k, 5);
        for i in 0..k {
            assert_eq!(out.matrix[i][i], 0.0);
            for j in 0..k {
                assert!(
                    (out.matrix[i][j] - out.matrix[j][i]).abs() < 1e-12,
                    "matrix asymmetric at ({}, {})",
                    i,
                    j
                );
            }
        }
        // Coherence is the matrix mean over the off-diagonal count.
        let sum: f64 = out.matrix.iter().flatten().sum();
        assert!((out.coherence - sum / 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_harmonics_sorted_by_amplitude() {
        let scores = sample_scores(64);
        let out = resonance(&ResonanceInput::with_default_params(&scores)).unwrap();
        for pair in out.harmonics.windows(2) {
            assert!(pair[0].amplitude >= pair[1].amplitude);
        }
        // The strongest component is the period-8 carrier.
        assert!((out.harmonics[0].frequency - 0.125).abs() < 1e-9);
    }

    #[test]
    fn test_forecast_length_and_energy_bounds() {
        let scores = sample_scores(50);
        let out = resonance(&ResonanceInput::with_default_params(&scores)).unwrap();
        assert_eq!(out.forecast.len(), 5);
        assert!(out.energy_index > -1.0 && out.energy_index < 1.0);
        assert!((out.energy_index - out.forecast[0].tanh()).abs() < 1e-12);
    }

    #[test]
    fn test_frequency_estimate_fallback() {
        // Monotone positive series has no sign change: fallback 1.
        let series: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        assert_eq!(estimate_frequency(&series), 1.0);
        // Alternating signs: gap 1 between changes -> 1/(2*1).
        let alt: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert_eq!(estimate_frequency(&alt), 0.5);
    }

    #[test]
    fn test_classification_gates() {
        // Extreme positive energy with a diffuse spectrum falls back to
        // Purple; focused spectrum reaches Pink-Surge.
        assert_eq!(classify(0.9, 0.0, 2.0), EnergyBucket::Purple);
        assert_eq!(classify(0.9, 0.0, 0.5), EnergyBucket::PinkSurge);
        assert_eq!(classify(0.5, 0.0, 0.0), EnergyBucket::Purple);
        assert_eq!(classify(0.0, 0.0, 0.0), EnergyBucket::NeutralDrift);
        assert_eq!(classify(-0.5, 0.0, 0.0), EnergyBucket::BluePullback);
        assert_eq!(classify(-0.9, 0.5, 0.0), EnergyBucket::CollapseRisk);
        assert_eq!(classify(-0.9, 0.1, 0.0), EnergyBucket::BluePullback);
    }

    #[test]
    fn test_idempotent() {
        let scores = sample_scores(45);
        let a = resonance(&ResonanceInput::with_default_params(&scores)).unwrap();
        let b = resonance(&ResonanceInput::with_default_params(&scores)).unwrap();
        assert_eq!(a.forecast.len(), b.forecast.len());
        for (x, y) in a.forecast.iter().zip(b.forecast.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
        assert_eq!(a.bucket, b.bucket);
    }
}
