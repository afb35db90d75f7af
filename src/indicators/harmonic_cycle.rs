//! # Harmonic Cycle Detector
//!
//! Spectral decomposition of the score series: dominant and micro cycle
//! extraction, phase-wave labeling, sinusoidal wave fit with a short
//! forward forecast, and the interference read between the two waves.
//!
//! ## Parameters
//! - **forecast_len**: forward steps for the harmonic forecast (default: 5)
//! - **micro_band**: frequency band for the secondary component
//!   (default: (0.08, 0.15), exclusive bounds)
//!
//! This stage never fails: with fewer than 20 rounds every field is
//! undefined and the interference label reads "N/A".

use crate::utilities::helpers::{linreg_slope, population_std};
use crate::utilities::spectrum::{bin_frequencies, dominant_bin, mean_centered, rfft};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::f64::consts::TAU;

/// Minimum history length before any cycle is reported.
const MIN_ROUNDS: usize = 20;

/// Seconds per forecast step; a presentation convenience for chart time
/// axes, retained from the tracker UI.
const FORECAST_STEP_SECONDS: i64 = 5;

#[derive(Debug, Clone)]
pub struct HarmonicCycleParams {
    pub forecast_len: Option<usize>,
    pub micro_band: Option<(f64, f64)>,
}

impl Default for HarmonicCycleParams {
    fn default() -> Self {
        Self {
            forecast_len: Some(5),
            micro_band: Some((0.08, 0.15)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarmonicCycleInput<'a> {
    pub scores: &'a [f64],
    /// Timestamp of the most recent round; forecast timestamps advance from
    /// here. None suppresses forecast times.
    pub last_timestamp: Option<DateTime<Utc>>,
    pub params: HarmonicCycleParams,
}

impl<'a> HarmonicCycleInput<'a> {
    pub fn new(
        scores: &'a [f64],
        last_timestamp: Option<DateTime<Utc>>,
        params: HarmonicCycleParams,
    ) -> Self {
        Self {
            scores,
            last_timestamp,
            params,
        }
    }

    pub fn with_default_params(scores: &'a [f64]) -> Self {
        Self {
            scores,
            last_timestamp: None,
            params: HarmonicCycleParams::default(),
        }
    }

    #[inline]
    fn get_forecast_len(&self) -> usize {
        self.params.forecast_len.unwrap_or(5)
    }

    #[inline]
    fn get_micro_band(&self) -> (f64, f64) {
        self.params.micro_band.unwrap_or((0.08, 0.15))
    }
}

/// Position within the dominant cycle, by percentage bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhaseLabel {
    Birth,
    Ascent,
    Peak,
    PostPeak,
    Falling,
    End,
}

impl PhaseLabel {
    pub fn from_pct(pct: f64) -> Self {
        if pct <= 16.0 {
            PhaseLabel::Birth
        } else if pct <= 33.0 {
            PhaseLabel::Ascent
        } else if pct <= 50.0 {
            PhaseLabel::Peak
        } else if pct <= 67.0 {
            PhaseLabel::PostPeak
        } else if pct <= 84.0 {
            PhaseLabel::Falling
        } else {
            PhaseLabel::End
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PhaseLabel::Birth => "Birth Phase",
            PhaseLabel::Ascent => "Ascent Phase",
            PhaseLabel::Peak => "Peak Phase",
            PhaseLabel::PostPeak => "Post-Peak",
            PhaseLabel::Falling => "Falling Phase",
            PhaseLabel::End => "End Phase",
        }
    }
}

/// Chart zone color for a wave position percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZoneColor {
    Green,
    Gold,
    Orange,
    Red,
}

impl ZoneColor {
    pub fn from_pct(pct: f64) -> Self {
        if pct <= 33.0 {
            ZoneColor::Green
        } else if pct <= 50.0 {
            ZoneColor::Gold
        } else if pct <= 67.0 {
            ZoneColor::Orange
        } else {
            ZoneColor::Red
        }
    }
}

/// Sign relationship of the dominant and micro wave trend slopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Interference {
    Constructive,
    Destructive,
    Neutral,
    NotAvailable,
}

impl Interference {
    pub fn label(self) -> &'static str {
        match self {
            Interference::Constructive => "Constructive (Aligned)",
            Interference::Destructive => "Destructive (Conflict)",
            Interference::Neutral => "Neutral or Unclear",
            Interference::NotAvailable => "N/A",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HarmonicCycleOutput {
    pub dominant_frequency: Option<f64>,
    pub dominant_phase: Option<f64>,
    /// `round(1 / dominant_frequency)`; None below 20 rounds or at zero
    /// frequency.
    pub dominant_cycle: Option<usize>,
    /// `round_count mod cycle_length`.
    pub phase_position: Option<usize>,
    pub wave_label: Option<PhaseLabel>,
    pub wave_pct: Option<f64>,
    pub zone: Option<ZoneColor>,
    pub micro_frequency: Option<f64>,
    pub micro_phase: Option<f64>,
    pub micro_cycle: Option<usize>,
    pub micro_position: Option<usize>,
    pub micro_label: Option<PhaseLabel>,
    /// Reconstructed dominant wave over the observed range.
    pub harmonic_wave: Vec<f64>,
    pub micro_wave: Vec<f64>,
    /// Dominant wave extrapolated `forecast_len` steps forward.
    pub harmonic_forecast: Vec<f64>,
    pub forecast_times: Vec<DateTime<Utc>>,
    /// Forecast +/- the score amplitude (one standard deviation channel).
    pub upper_channel: Vec<f64>,
    pub lower_channel: Vec<f64>,
    pub dom_slope: f64,
    pub micro_slope: f64,
    pub interference: Interference,
    /// Energy Integrity Score: purples + 2*pinks - blues over the whole
    /// history, counted from scores.
    pub eis: i64,
}

impl HarmonicCycleOutput {
    fn insufficient() -> Self {
        Self {
            dominant_frequency: None,
            dominant_phase: None,
            dominant_cycle: None,
            phase_position: None,
            wave_label: None,
            wave_pct: None,
            zone: None,
            micro_frequency: None,
            micro_phase: None,
            micro_cycle: None,
            micro_position: None,
            micro_label: None,
            harmonic_wave: Vec::new(),
            micro_wave: Vec::new(),
            harmonic_forecast: Vec::new(),
            forecast_times: Vec::new(),
            upper_channel: Vec::new(),
            lower_channel: Vec::new(),
            dom_slope: 0.0,
            micro_slope: 0.0,
            interference: Interference::NotAvailable,
            eis: 0,
        }
    }
}

/// Dominant cycle length of a score series, or None when the series is too
/// short or the strongest bin resolves to zero frequency.
pub fn detect_dominant_cycle(scores: &[f64]) -> Option<usize> {
    let n = scores.len();
    if n < MIN_ROUNDS {
        return None;
    }
    let spectrum = rfft(&mean_centered(scores));
    let bin = dominant_bin(&spectrum)?;
    let freq = bin_frequencies(n)[bin];
    if freq == 0.0 {
        return None;
    }
    Some((1.0 / freq).round() as usize)
}

fn position_of(n: usize, cycle: usize) -> (usize, f64) {
    let position = n % cycle;
    let pct = position as f64 / cycle as f64 * 100.0;
    (position, pct)
}

pub fn harmonic_cycle(input: &HarmonicCycleInput) -> HarmonicCycleOutput {
    let scores = input.scores;
    let n = scores.len();
    if n < MIN_ROUNDS {
        return HarmonicCycleOutput::insufficient();
    }

    let centered = mean_centered(scores);
    let spectrum = rfft(&centered);
    let freqs = bin_frequencies(n);
    let Some(dom_idx) = dominant_bin(&spectrum) else {
        return HarmonicCycleOutput::insufficient();
    };
    let dominant_frequency = freqs[dom_idx];
    if dominant_frequency == 0.0 {
        return HarmonicCycleOutput::insufficient();
    }
    let dominant_cycle = (1.0 / dominant_frequency).round() as usize;
    let dominant_phase = spectrum[dom_idx].arg();

    let (phase_position, wave_pct) = position_of(n, dominant_cycle);
    let wave_label = PhaseLabel::from_pct(wave_pct);
    let zone = ZoneColor::from_pct(wave_pct);

    let harmonic_wave: Vec<f64> = (0..n)
        .map(|t| (TAU * dominant_frequency * t as f64 + dominant_phase).sin())
        .collect();
    let dom_slope = linreg_slope(&harmonic_wave);

    let forecast_len = input.get_forecast_len();
    let harmonic_forecast: Vec<f64> = (n..n + forecast_len)
        .map(|t| (TAU * dominant_frequency * t as f64 + dominant_phase).sin())
        .collect();
    let forecast_times = match input.last_timestamp {
        Some(last) => (0..forecast_len)
            .map(|i| last + Duration::seconds(FORECAST_STEP_SECONDS * i as i64))
            .collect(),
        None => Vec::new(),
    };
    let amplitude = population_std(scores);
    let upper_channel: Vec<f64> = harmonic_forecast.iter().map(|v| v + amplitude).collect();
    let lower_channel: Vec<f64> = harmonic_forecast.iter().map(|v| v - amplitude).collect();

    // Secondary (micro) component restricted to the configured band.
    let (micro_lo, micro_hi) = input.get_micro_band();
    let micro_idx = spectrum
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(k, _)| freqs[*k] > micro_lo && freqs[*k] < micro_hi)
        .max_by(|(_, a), (_, b)| {
            a.norm()
                .partial_cmp(&b.norm())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(k, _)| k);

    let (micro_frequency, micro_phase) = match micro_idx {
        Some(k) => (freqs[k], spectrum[k].arg()),
        None => (0.0, 0.0),
    };
    let micro_wave: Vec<f64> = (0..n)
        .map(|t| (TAU * micro_frequency * t as f64 + micro_phase).sin())
        .collect();
    let micro_slope = linreg_slope(&micro_wave);
    let (micro_cycle, micro_position, micro_label) = if micro_frequency > 0.0 {
        let cycle = (1.0 / micro_frequency).round() as usize;
        let (position, pct) = position_of(n, cycle);
        (Some(cycle), Some(position), Some(PhaseLabel::from_pct(pct)))
    } else {
        (None, None, None)
    };

    let interference = if dom_slope > 0.0 && micro_slope > 0.0 {
        Interference::Constructive
    } else if dom_slope * micro_slope < 0.0 {
        Interference::Destructive
    } else {
        Interference::Neutral
    };

    // EIS over the whole history, counted from scores.
    let mut eis = 0i64;
    for &s in scores {
        if s < 0.0 {
            eis -= 1;
        } else if s >= 2.0 {
            eis += 2;
        } else {
            eis += 1;
        }
    }

    HarmonicCycleOutput {
        dominant_frequency: Some(dominant_frequency),
        dominant_phase: Some(dominant_phase),
        dominant_cycle: Some(dominant_cycle),
        phase_position: Some(phase_position),
        wave_label: Some(wave_label),
        wave_pct: Some(wave_pct),
        zone: Some(zone),
        micro_frequency: Some(micro_frequency),
        micro_phase: Some(micro_phase),
        micro_cycle,
        micro_position,
        micro_label,
        harmonic_wave,
        micro_wave,
        harmonic_forecast,
        forecast_times,
        upper_channel,
        lower_channel,
        dom_slope,
        micro_slope,
        interference,
        eis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    #[test]
    fn test_insufficient_data_is_na() {
        let scores = vec![1.0; 19];
        let out = harmonic_cycle(&HarmonicCycleInput::with_default_params(&scores));
        assert_eq!(out.dominant_cycle, None);
        assert_eq!(out.interference, Interference::NotAvailable);
        assert!(out.harmonic_wave.is_empty());
        assert_eq!(out.eis, 0);
    }

    #[test]
    fn test_recovers_planted_period() {
        // Pure sinusoid of period 8 over 48 samples (>= 3 periods): the
        // detected cycle must land within +/-1 of the true period.
        let scores: Vec<f64> = (0..48).map(|t| (TAU * t as f64 / 8.0).sin()).collect();
        let cycle = detect_dominant_cycle(&scores).expect("cycle expected");
        assert!(
            (cycle as i64 - 8).abs() <= 1,
            "detected {} expected ~8",
            cycle
        );
    }

    #[test]
    fn test_phase_label_bands() {
        assert_eq!(PhaseLabel::from_pct(0.0), PhaseLabel::Birth);
        assert_eq!(PhaseLabel::from_pct(16.0), PhaseLabel::Birth);
        assert_eq!(PhaseLabel::from_pct(20.0), PhaseLabel::Ascent);
        assert_eq!(PhaseLabel::from_pct(40.0), PhaseLabel::Peak);
        assert_eq!(PhaseLabel::from_pct(60.0), PhaseLabel::PostPeak);
        assert_eq!(PhaseLabel::from_pct(80.0), PhaseLabel::Falling);
        assert_eq!(PhaseLabel::from_pct(95.0), PhaseLabel::End);
    }

    #[test]
    fn test_wave_and_forecast_lengths() {
        let scores: Vec<f64> = (0..40)
            .map(|t| if t % 2 == 0 { -1.0 } else { 1.0 })
            .collect();
        let last = Utc::now();
        let out = harmonic_cycle(&HarmonicCycleInput::new(
            &scores,
            Some(last),
            HarmonicCycleParams::default(),
        ));
        assert_eq!(out.harmonic_wave.len(), 40);
        assert_eq!(out.micro_wave.len(), 40);
        assert_eq!(out.harmonic_forecast.len(), 5);
        assert_eq!(out.forecast_times.len(), 5);
        assert_eq!(out.forecast_times[0], last);
        assert_eq!(out.forecast_times[4], last + Duration::seconds(20));
        assert_eq!(out.upper_channel.len(), 5);
        // Channel is symmetric around the forecast.
        for i in 0..5 {
            let mid = (out.upper_channel[i] + out.lower_channel[i]) / 2.0;
            assert!((mid - out.harmonic_forecast[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_alternating_scores_resolve_cycle_two() {
        let scores: Vec<f64> = (0..25)
            .map(|t| if t % 2 == 0 { -1.0 } else { 1.0 })
            .collect();
        let out = harmonic_cycle(&HarmonicCycleInput::with_default_params(&scores));
        assert_eq!(out.dominant_cycle, Some(2));
        assert_eq!(out.phase_position, Some(1)); // 25 mod 2
    }

    #[test]
    fn test_eis_counts() {
        // 20 scores: 8 blue (-1), 8 purple (1), 4 pink (2) -> -8 + 8 + 8 = 8.
        let mut scores = vec![-1.0; 8];
        scores.extend(vec![1.0; 8]);
        scores.extend(vec![2.0; 4]);
        let out = harmonic_cycle(&HarmonicCycleInput::with_default_params(&scores));
        assert_eq!(out.eis, 8);
    }

    #[test]
    fn test_micro_band_selection() {
        // Period 10 (freq 0.1) sits inside the micro band; period 4 (freq
        // 0.25) dominates outside it.
        let scores: Vec<f64> = (0..80)
            .map(|t| {
                let t = t as f64;
                2.0 * (TAU * t / 4.0).sin() + (TAU * t / 10.0).sin()
            })
            .collect();
        let out = harmonic_cycle(&HarmonicCycleInput::with_default_params(&scores));
        assert_eq!(out.dominant_cycle, Some(4));
        let mf = out.micro_frequency.unwrap();
        assert!((mf - 0.1).abs() < 0.02, "micro frequency {}", mf);
        assert_eq!(out.micro_cycle, Some(10));
    }
}
