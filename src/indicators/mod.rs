pub mod bands;
pub mod chain_forecast;
pub mod decision;
pub mod fractal;
pub mod harmonic_cycle;
pub mod msi;
pub mod resonance;
pub mod rrqi;
pub mod score;
pub mod tpi;

pub use bands::{
    band_geometry, volatility_bands, BandGeometryOutput, VolatilityBandsError,
    VolatilityBandsInput, VolatilityBandsOutput, VolatilityBandsParams,
};
pub use chain_forecast::{
    chain_forecast, ChainForecastInput, ChainForecastOutput, ChainForecastParams, ChainLabel,
    ChainStep,
};
pub use decision::{decide, Banner, DecisionInput, DecisionOutput, DecisionReason};
pub use fractal::{
    fractal_anchor, fractal_pulse, AnchorInput, AnchorParams, MatchRecord, PulseInput,
    PulseOutput, PulseParams, WindowMatch,
};
pub use harmonic_cycle::{
    detect_dominant_cycle, harmonic_cycle, HarmonicCycleInput, HarmonicCycleOutput,
    HarmonicCycleParams, Interference, PhaseLabel, ZoneColor,
};
pub use msi::{momentum, msi, MsiError, MsiInput, MsiOutput, MsiParams};
pub use resonance::{resonance, EnergyBucket, ResonanceInput, ResonanceOutput, ResonanceParams};
pub use rrqi::{rrqi, RrqiError, RrqiInput, RrqiOutput, RrqiParams, RrqiZone};
pub use score::{classify_round, Round, RoundCategory, ScoreError};
pub use tpi::{surge_readout, tpi, SurgeReadout, TpiError, TpiInput, TpiOutput, TpiParams};
