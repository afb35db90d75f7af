//! # Momentum Score Index (MSI)
//!
//! Rolling sum of per-round scores over a configurable window, plus the
//! cumulative momentum series.
//!
//! ## Parameters
//! - **window**: rolling window size (default: 20)
//!
//! ## Returns
//! - **MsiOutput** with one value per input index; NaN until a full window
//!   of scores exists.

use crate::utilities::helpers::alloc_with_nan_prefix;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct MsiParams {
    pub window: Option<usize>,
}

impl Default for MsiParams {
    fn default() -> Self {
        Self { window: Some(20) }
    }
}

#[derive(Debug, Clone)]
pub struct MsiInput<'a> {
    pub scores: &'a [f64],
    pub params: MsiParams,
}

impl<'a> MsiInput<'a> {
    pub fn new(scores: &'a [f64], params: MsiParams) -> Self {
        Self { scores, params }
    }

    pub fn with_default_params(scores: &'a [f64]) -> Self {
        Self {
            scores,
            params: MsiParams::default(),
        }
    }

    #[inline]
    fn get_window(&self) -> usize {
        self.params.window.unwrap_or(20)
    }
}

#[derive(Debug, Clone)]
pub struct MsiOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Error)]
pub enum MsiError {
    #[error("msi: Invalid window: window = {window}")]
    InvalidWindow { window: usize },
}

/// Rolling score sum. A history shorter than the window yields an all-NaN
/// series rather than an error; the pipeline treats that as "not yet
/// defined", never as zero.
pub fn msi(input: &MsiInput) -> Result<MsiOutput, MsiError> {
    let scores = input.scores;
    let window = input.get_window();
    if window == 0 {
        return Err(MsiError::InvalidWindow { window });
    }

    let n = scores.len();
    let mut values = alloc_with_nan_prefix(n, window.saturating_sub(1).min(n));
    if n < window {
        return Ok(MsiOutput { values });
    }

    let mut sum: f64 = scores[..window].iter().sum();
    values[window - 1] = sum;
    for i in window..n {
        sum += scores[i] - scores[i - window];
        values[i] = sum;
    }
    Ok(MsiOutput { values })
}

/// Cumulative score sum over the whole history, defined from index 0.
pub fn momentum(scores: &[f64]) -> Vec<f64> {
    let mut running = 0.0;
    scores
        .iter()
        .map(|s| {
            running += s;
            running
        })
        .collect()
}
