//! # Round Readiness/Quality Index (RRQI)
//!
//! Weighted category balance over the trailing window:
//! `(purples + 2*pinks - blues) / window`, rounded to 2 decimals.
//!
//! Works on categorized rounds, not raw score slices; the divisor is always
//! the full window length even when fewer rounds exist yet.

use crate::indicators::score::{Round, RoundCategory};
use crate::utilities::helpers::round_dp;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct RrqiParams {
    pub window: Option<usize>,
    pub pink_threshold: Option<f64>,
}

impl Default for RrqiParams {
    fn default() -> Self {
        Self {
            window: Some(30),
            pink_threshold: Some(10.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RrqiInput<'a> {
    pub rounds: &'a [Round],
    pub params: RrqiParams,
}

impl<'a> RrqiInput<'a> {
    pub fn new(rounds: &'a [Round], params: RrqiParams) -> Self {
        Self { rounds, params }
    }

    pub fn with_default_params(rounds: &'a [Round]) -> Self {
        Self {
            rounds,
            params: RrqiParams::default(),
        }
    }

    #[inline]
    fn get_window(&self) -> usize {
        self.params.window.unwrap_or(30)
    }

    #[inline]
    fn get_pink_threshold(&self) -> f64 {
        self.params.pink_threshold.unwrap_or(10.0)
    }
}

/// Session quality zone implied by the RRQI level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RrqiZone {
    HappyHour,
    DeadZone,
    Mixed,
}

impl RrqiZone {
    pub fn label(self) -> &'static str {
        match self {
            RrqiZone::HappyHour => "Happy Hour Detected — Tactical Entry Zone",
            RrqiZone::DeadZone => "Dead Zone — Avoid Aggressive Entries",
            RrqiZone::Mixed => "Mixed Zone — Scout Cautiously",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RrqiOutput {
    pub value: f64,
    pub zone: RrqiZone,
}

#[derive(Debug, Error)]
pub enum RrqiError {
    #[error("rrqi: Invalid window: window = {window}")]
    InvalidWindow { window: usize },
}

pub fn rrqi(input: &RrqiInput) -> Result<RrqiOutput, RrqiError> {
    let window = input.get_window();
    if window == 0 {
        return Err(RrqiError::InvalidWindow { window });
    }
    let threshold = input.get_pink_threshold();
    let tail_start = input.rounds.len().saturating_sub(window);

    let mut purples = 0usize;
    let mut pinks = 0usize;
    let mut blues = 0usize;
    for round in &input.rounds[tail_start..] {
        match round.category(threshold) {
            RoundCategory::Purple => purples += 1,
            RoundCategory::Pink => pinks += 1,
            RoundCategory::Blue => blues += 1,
        }
    }

    let value = round_dp(
        (purples as f64 + 2.0 * pinks as f64 - blues as f64) / window as f64,
        2,
    );
    let zone = if value >= 0.3 {
        RrqiZone::HappyHour
    } else if value <= -0.2 {
        RrqiZone::DeadZone
    } else {
        RrqiZone::Mixed
    };
    Ok(RrqiOutput { value, zone })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::data_loader::read_rounds_from_csv;
    use chrono::Utc;

    fn round_with(multiplier: f64) -> Round {
        let score = if multiplier >= 10.0 {
            2.0
        } else if multiplier >= 2.0 {
            1.0
        } else {
            -1.0
        };
        Round {
            timestamp: Utc::now(),
            multiplier,
            score,
        }
    }

    #[test]
    fn test_rrqi_mixed_window() {
        // 10 Purple, 5 Pink, 15 Blue over a 30-round window:
        // (10 + 2*5 - 15) / 30 = 0.1666... -> 0.17
        let mut rounds = Vec::new();
        rounds.extend((0..10).map(|_| round_with(3.0)));
        rounds.extend((0..5).map(|_| round_with(12.0)));
        rounds.extend((0..15).map(|_| round_with(1.2)));
        let out = rrqi(&RrqiInput::with_default_params(&rounds)).unwrap();
        assert_eq!(out.value, 0.17);
        assert_eq!(out.zone, RrqiZone::Mixed);
    }

    #[test]
    fn test_rrqi_short_history_divides_by_full_window() {
        // 6 pinks in a 30 window: (0 + 12 - 0) / 30 = 0.4.
        let rounds: Vec<Round> = (0..6).map(|_| round_with(15.0)).collect();
        let out = rrqi(&RrqiInput::with_default_params(&rounds)).unwrap();
        assert_eq!(out.value, 0.4);
        assert_eq!(out.zone, RrqiZone::HappyHour);
    }

    #[test]
    fn test_rrqi_dead_zone() {
        let rounds: Vec<Round> = (0..30).map(|_| round_with(1.1)).collect();
        let out = rrqi(&RrqiInput::with_default_params(&rounds)).unwrap();
        assert_eq!(out.value, -1.0);
        assert_eq!(out.zone, RrqiZone::DeadZone);
    }

    #[test]
    fn test_rrqi_fixture() {
        let rounds = read_rounds_from_csv("src/data/sample_rounds.csv", 10.0)
            .expect("Failed to load sample rounds");
        let out = rrqi(&RrqiInput::with_default_params(&rounds)).unwrap();
        assert_eq!(out.value, 0.27);
    }
}
