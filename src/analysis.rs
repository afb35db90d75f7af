//! Full-pipeline analysis: the sole function boundary the presentation
//! layer calls. Every stage is recomputed over the whole history; nothing
//! here is incremental. Memoization lives in [`crate::session`], keyed by
//! [`content_hash`].

use crate::indicators::bands::{
    band_geometry, volatility_bands, BandGeometryOutput, VolatilityBandsError,
    VolatilityBandsInput, VolatilityBandsOutput, VolatilityBandsParams,
};
use crate::indicators::chain_forecast::{
    chain_forecast, ChainForecastInput, ChainForecastOutput, ChainForecastParams,
};
use crate::indicators::decision::{decide, DecisionInput, DecisionOutput};
use crate::indicators::fractal::{
    fractal_anchor, fractal_pulse, AnchorInput, AnchorParams, MatchRecord, PulseInput,
    PulseOutput, PulseParams,
};
use crate::indicators::harmonic_cycle::{
    harmonic_cycle, HarmonicCycleInput, HarmonicCycleOutput, HarmonicCycleParams,
};
use crate::indicators::msi::{momentum, msi, MsiError, MsiInput, MsiParams};
use crate::indicators::resonance::{resonance, ResonanceInput, ResonanceOutput};
use crate::indicators::rrqi::{rrqi, RrqiError, RrqiInput, RrqiParams, RrqiOutput};
use crate::indicators::score::{Round, RoundCategory, ScoreError};
use crate::indicators::tpi::{surge_readout, tpi, SurgeReadout, TpiError, TpiInput, TpiOutput, TpiParams};
use crate::session::{ConfigError, TrackerConfig};
use crate::utilities::helpers::round_dp;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Latest band geometry read-outs, formatted the way the tracker HUD shows
/// them: percentages (x100, rounded) once more than 20 rounds exist, raw
/// 4-decimal values before that. None where the series is still undefined.
#[derive(Debug, Clone, Serialize)]
pub struct BandStats {
    pub upper_slope: Option<f64>,
    pub lower_slope: Option<f64>,
    pub upper_accel: Option<f64>,
    pub lower_accel: Option<f64>,
    pub bandwidth: Option<f64>,
    pub bandwidth_delta: Option<f64>,
}

/// Everything the presentation layer consumes, one record per stage.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Category per round, derived from the configured pink threshold.
    pub categories: Vec<RoundCategory>,
    /// Score per round, always recomputed together with the category.
    pub scores: Vec<f64>,
    pub msi: Vec<f64>,
    pub momentum: Vec<f64>,
    /// Last MSI value; 0 while the series is still entirely undefined.
    pub latest_msi: f64,
    pub tpi: TpiOutput,
    pub surge: SurgeReadout,
    pub rrqi: RrqiOutput,
    /// (10, 1.5) band over MSI; geometry derives from this one.
    pub bands_short: VolatilityBandsOutput,
    /// (20, 2.0) band over MSI.
    pub bands_mid: VolatilityBandsOutput,
    /// (40, 2.5) band over MSI.
    pub bands_long: VolatilityBandsOutput,
    pub geometry: BandGeometryOutput,
    pub band_stats: BandStats,
    pub cycle: HarmonicCycleOutput,
    pub resonance: Option<ResonanceOutput>,
    pub chain: ChainForecastOutput,
    pub pulse: PulseOutput,
    pub anchor: Option<MatchRecord>,
    pub decision: DecisionOutput,
}

/// Any inconsistency inside one `analyze` call surfaces as a single
/// aggregate error; partial results are never returned.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("analyze: {0}")]
    Config(#[from] ConfigError),
    #[error("analyze: {0}")]
    Score(#[from] ScoreError),
    #[error("analyze: {0}")]
    Msi(#[from] MsiError),
    #[error("analyze: {0}")]
    Tpi(#[from] TpiError),
    #[error("analyze: {0}")]
    Rrqi(#[from] RrqiError),
    #[error("analyze: {0}")]
    Bands(#[from] VolatilityBandsError),
    #[error("analyze: Internal inconsistency: {detail}")]
    Internal { detail: String },
}

/// Content hash of the exact `(history, configuration)` pair. Identical
/// histories and configs always collide; any change to either produces a
/// new key.
pub fn content_hash(rounds: &[Round], config: &TrackerConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    for round in rounds {
        round.timestamp.timestamp_millis().hash(&mut hasher);
        round.multiplier.to_bits().hash(&mut hasher);
        round.score.to_bits().hash(&mut hasher);
    }
    config.window_size.hash(&mut hasher);
    config.pink_threshold.to_bits().hash(&mut hasher);
    config.strict_rtt.hash(&mut hasher);
    hasher.finish()
}

fn latest_defined(series: &[f64]) -> Option<f64> {
    series.last().copied().filter(|v| !v.is_nan())
}

fn band_stats(geometry: &BandGeometryOutput, n: usize) -> BandStats {
    let safe = |series: &[f64]| -> Option<f64> {
        series
            .last()
            .copied()
            .filter(|v| !v.is_nan())
            .map(|v| round_dp(v, 4))
    };
    let scale = |v: Option<f64>| {
        if n > 20 {
            v.map(|x| (x * 100.0).round())
        } else {
            v
        }
    };
    BandStats {
        upper_slope: scale(safe(&geometry.upper_slope)),
        lower_slope: scale(safe(&geometry.lower_slope)),
        upper_accel: scale(safe(&geometry.upper_accel)),
        lower_accel: scale(safe(&geometry.lower_accel)),
        bandwidth: if n > 20 {
            safe(&geometry.bandwidth).map(|x| x.round())
        } else {
            safe(&geometry.bandwidth)
        },
        bandwidth_delta: scale(safe(&geometry.bandwidth_delta)),
    }
}

/// Runs the whole pipeline over `rounds` under `config`. Pure and
/// deterministic: the chain forecaster's jitter is seeded from the content
/// hash, so identical inputs return bit-identical results.
pub fn analyze_rounds(
    rounds: &[Round],
    config: &TrackerConfig,
) -> Result<AnalysisResult, AnalyzeError> {
    config.validate()?;
    let n = rounds.len();
    let threshold = config.pink_threshold;

    // Category and score derive together from the live threshold; the
    // scores stored on the rounds may predate a threshold change.
    let categories: Vec<RoundCategory> = rounds.iter().map(|r| r.category(threshold)).collect();
    let scores: Vec<f64> = categories.iter().map(|c| c.score()).collect();

    let msi_out = msi(&MsiInput::new(
        &scores,
        MsiParams {
            window: Some(config.window_size),
        },
    ))?;
    let momentum_out = momentum(&scores);
    let latest_msi = latest_defined(&msi_out.values).unwrap_or(0.0);

    let tpi_out = tpi(&TpiInput::new(
        rounds,
        TpiParams {
            window: Some(config.window_size),
            pink_threshold: Some(threshold),
        },
    ))?;
    let surge = surge_readout(latest_msi, tpi_out.tpi);

    let rrqi_out = rrqi(&RrqiInput::new(
        rounds,
        RrqiParams {
            window: Some(30),
            pink_threshold: Some(threshold),
        },
    ))?;

    let band_pair = |window: usize, num_std: f64| {
        volatility_bands(&VolatilityBandsInput::new(
            &msi_out.values,
            VolatilityBandsParams {
                window: Some(window),
                num_std: Some(num_std),
            },
        ))
    };
    let bands_short = band_pair(10, 1.5)?;
    let bands_mid = band_pair(20, 2.0)?;
    let bands_long = band_pair(40, 2.5)?;
    let geometry = band_geometry(&bands_short.upper, &bands_short.lower);
    let stats = band_stats(&geometry, n);

    let cycle = harmonic_cycle(&HarmonicCycleInput::new(
        &scores,
        rounds.last().map(|r| r.timestamp),
        HarmonicCycleParams::default(),
    ));

    let resonance_out = resonance(&ResonanceInput::with_default_params(&scores));

    let mut rng = StdRng::seed_from_u64(content_hash(rounds, config));
    let chain = chain_forecast(
        &ChainForecastInput::new(&scores, ChainForecastParams::default()),
        &mut rng,
    );

    let pulse = fractal_pulse(&PulseInput::new(
        &categories,
        &scores,
        PulseParams::default(),
    ));
    let anchor = fractal_anchor(&AnchorInput::new(
        &categories,
        &msi_out.values,
        AnchorParams::default(),
    ));

    let decision = decide(&DecisionInput {
        cycle: Some(&cycle),
        resonance: resonance_out.as_ref(),
        pulse: pulse.best.as_ref(),
        anchor: anchor.as_ref(),
    });

    // One aggregate consistency check before anything is returned.
    for (name, len) in [
        ("categories", categories.len()),
        ("scores", scores.len()),
        ("msi", msi_out.values.len()),
        ("momentum", momentum_out.len()),
        ("bands_short", bands_short.upper.len()),
        ("bands_mid", bands_mid.upper.len()),
        ("bands_long", bands_long.upper.len()),
        ("geometry.bandwidth", geometry.bandwidth.len()),
    ] {
        if len != n {
            return Err(AnalyzeError::Internal {
                detail: format!("{} has length {}, expected {}", name, len, n),
            });
        }
    }

    Ok(AnalysisResult {
        categories,
        scores,
        msi: msi_out.values,
        momentum: momentum_out,
        latest_msi,
        tpi: tpi_out,
        surge,
        rrqi: rrqi_out,
        bands_short,
        bands_mid,
        bands_long,
        geometry,
        band_stats: stats,
        cycle,
        resonance: resonance_out,
        chain,
        pulse,
        anchor,
        decision,
    })
}
