//! # Trend Pressure Index (TPI)
//!
//! Purple pressure minus blue decay over the trailing window, on categorized
//! rounds. Positive TPI reads as genuine upward pressure; negative TPI with
//! a high MSI flags a hollow surge.
//!
//! ## Parameters
//! - **window**: trailing window length (default: 10)
//! - **pink_threshold**: category boundary for Pink rounds (default: 10.0)

use crate::indicators::score::{Round, RoundCategory};
use crate::utilities::helpers::round_dp;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct TpiParams {
    pub window: Option<usize>,
    pub pink_threshold: Option<f64>,
}

impl Default for TpiParams {
    fn default() -> Self {
        Self {
            window: Some(10),
            pink_threshold: Some(10.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TpiInput<'a> {
    pub rounds: &'a [Round],
    pub params: TpiParams,
}

impl<'a> TpiInput<'a> {
    pub fn new(rounds: &'a [Round], params: TpiParams) -> Self {
        Self { rounds, params }
    }

    pub fn with_default_params(rounds: &'a [Round]) -> Self {
        Self {
            rounds,
            params: TpiParams::default(),
        }
    }

    #[inline]
    fn get_window(&self) -> usize {
        self.params.window.unwrap_or(10)
    }

    #[inline]
    fn get_pink_threshold(&self) -> f64 {
        self.params.pink_threshold.unwrap_or(10.0)
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TpiOutput {
    pub purple_pressure: f64,
    pub blue_decay: f64,
    /// `purple_pressure - blue_decay`, rounded to 2 decimals.
    pub tpi: f64,
}

#[derive(Debug, Error)]
pub enum TpiError {
    #[error("tpi: Invalid window: window = {window}")]
    InvalidWindow { window: usize },
}

/// Never fails on short or empty histories: missing categories contribute 0.
pub fn tpi(input: &TpiInput) -> Result<TpiOutput, TpiError> {
    let window = input.get_window();
    if window == 0 {
        return Err(TpiError::InvalidWindow { window });
    }
    let threshold = input.get_pink_threshold();
    let tail_start = input.rounds.len().saturating_sub(window);
    let recent = &input.rounds[tail_start..];

    let purple_pressure = recent
        .iter()
        .filter(|r| r.category(threshold) == RoundCategory::Purple)
        .map(|r| r.score)
        .sum::<f64>()
        / window as f64;

    let blue_mults: Vec<f64> = recent
        .iter()
        .filter(|r| r.category(threshold) == RoundCategory::Blue)
        .map(|r| r.multiplier)
        .collect();
    // The lower the blue multiplier, the stronger the decay.
    let blue_decay = if blue_mults.is_empty() {
        0.0
    } else {
        let avg: f64 = blue_mults.iter().map(|m| 2.0 - m).sum::<f64>() / blue_mults.len() as f64;
        avg * (blue_mults.len() as f64 / window as f64)
    };

    Ok(TpiOutput {
        purple_pressure,
        blue_decay,
        tpi: round_dp(purple_pressure - blue_decay, 2),
    })
}

/// HUD read-out of the latest MSI/TPI pair, as the tracker surfaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SurgeReadout {
    ValidSurge,
    HollowSurge,
    WeakSurge,
    TooSoft,
}

impl SurgeReadout {
    pub fn label(self) -> &'static str {
        match self {
            SurgeReadout::ValidSurge => "Valid Surge — Pressure Confirmed",
            SurgeReadout::HollowSurge => "Hollow Surge — Likely Trap",
            SurgeReadout::WeakSurge => "Weak Surge — Monitor Closely",
            SurgeReadout::TooSoft => "Trend too soft — TPI not evaluated",
        }
    }
}

/// TPI is only evaluated against surging momentum (MSI >= 3).
pub fn surge_readout(latest_msi: f64, latest_tpi: f64) -> SurgeReadout {
    if latest_msi >= 3.0 {
        if latest_tpi > 0.5 {
            SurgeReadout::ValidSurge
        } else if latest_tpi < -0.5 {
            SurgeReadout::HollowSurge
        } else {
            SurgeReadout::WeakSurge
        }
    } else {
        SurgeReadout::TooSoft
    }
}
