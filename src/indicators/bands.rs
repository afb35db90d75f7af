//! # Adaptive Volatility Bands
//!
//! Rolling mean/std bands over a numeric series (the MSI series in this
//! system), computed at several `(window, num_std)` pairs, plus the derived
//! band geometry: bandwidth, slopes, accelerations and the squeeze flag
//! that marks contraction regimes.
//!
//! ## Parameters
//! - **window**: rolling window size (default: 20)
//! - **num_std**: deviation multiplier (default: 2.0)
//!
//! ## Returns
//! - **VolatilityBandsOutput** with middle/upper/lower, NaN until a full
//!   window of non-missing samples exists.
//!
//! The standard deviation is the sample deviation (ddof = 1); a constant
//! window collapses the band onto its mean.

use crate::utilities::helpers::{alloc_with_nan_prefix, quantile_linear, sample_std};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct VolatilityBandsParams {
    pub window: Option<usize>,
    pub num_std: Option<f64>,
}

impl Default for VolatilityBandsParams {
    fn default() -> Self {
        Self {
            window: Some(20),
            num_std: Some(2.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VolatilityBandsInput<'a> {
    pub data: &'a [f64],
    pub params: VolatilityBandsParams,
}

impl<'a> VolatilityBandsInput<'a> {
    pub fn new(data: &'a [f64], params: VolatilityBandsParams) -> Self {
        Self { data, params }
    }

    pub fn with_default_params(data: &'a [f64]) -> Self {
        Self {
            data,
            params: VolatilityBandsParams::default(),
        }
    }

    #[inline]
    fn get_window(&self) -> usize {
        self.params.window.unwrap_or(20)
    }

    #[inline]
    fn get_num_std(&self) -> f64 {
        self.params.num_std.unwrap_or(2.0)
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VolatilityBandsOutput {
    pub middle: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

#[derive(Debug, Error)]
pub enum VolatilityBandsError {
    #[error("bands: Invalid window: window = {window}")]
    InvalidWindow { window: usize },
}

/// Rolling bands. Indices whose trailing window contains any missing (NaN)
/// sample stay NaN; short histories produce an all-NaN band, not an error.
pub fn volatility_bands(
    input: &VolatilityBandsInput,
) -> Result<VolatilityBandsOutput, VolatilityBandsError> {
    let data = input.data;
    let window = input.get_window();
    let num_std = input.get_num_std();
    if window == 0 {
        return Err(VolatilityBandsError::InvalidWindow { window });
    }

    let n = data.len();
    let warm = window.saturating_sub(1).min(n);
    let mut middle = alloc_with_nan_prefix(n, warm);
    let mut upper = alloc_with_nan_prefix(n, warm);
    let mut lower = alloc_with_nan_prefix(n, warm);

    if n < window {
        return Ok(VolatilityBandsOutput {
            middle,
            upper,
            lower,
        });
    }

    for i in (window - 1)..n {
        let slice = &data[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let m = slice.iter().sum::<f64>() / window as f64;
        let sd = sample_std(slice);
        middle[i] = m;
        upper[i] = m + num_std * sd;
        lower[i] = m - num_std * sd;
    }

    Ok(VolatilityBandsOutput {
        middle,
        upper,
        lower,
    })
}

/// First difference; NaN at index 0 and wherever either operand is NaN.
pub fn diff(series: &[f64]) -> Vec<f64> {
    let mut out = alloc_with_nan_prefix(series.len(), series.len().min(1));
    for i in 1..series.len() {
        out[i] = series[i] - series[i - 1];
    }
    out
}

/// Geometry of the short (10-window) band: width, expansion rate and the
/// squeeze flag that historically precedes expansion.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BandGeometryOutput {
    pub bandwidth: Vec<f64>,
    pub bandwidth_delta: Vec<f64>,
    pub upper_slope: Vec<f64>,
    pub lower_slope: Vec<f64>,
    pub upper_accel: Vec<f64>,
    pub lower_accel: Vec<f64>,
    pub squeeze: Vec<bool>,
}

/// Squeeze at index i: bandwidth below the rolling 5-sample 0.25-quantile
/// of itself. Windows containing NaN never flag.
pub fn band_geometry(upper: &[f64], lower: &[f64]) -> BandGeometryOutput {
    debug_assert_eq!(upper.len(), lower.len());
    let n = upper.len();
    let bandwidth: Vec<f64> = upper.iter().zip(lower.iter()).map(|(u, l)| u - l).collect();
    let bandwidth_delta = diff(&bandwidth);
    let upper_slope = diff(upper);
    let lower_slope = diff(lower);
    let upper_accel = diff(&upper_slope);
    let lower_accel = diff(&lower_slope);

    let mut squeeze = vec![false; n];
    const QUANTILE_WINDOW: usize = 5;
    for i in (QUANTILE_WINDOW - 1)..n {
        let slice = &bandwidth[i + 1 - QUANTILE_WINDOW..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        squeeze[i] = bandwidth[i] < quantile_linear(slice, 0.25);
    }

    BandGeometryOutput {
        bandwidth,
        bandwidth_delta,
        upper_slope,
        lower_slope,
        upper_accel,
        lower_accel,
        squeeze,
    }
}
