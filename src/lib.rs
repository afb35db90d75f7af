//! # quantum-tracker
//!
//! Streaming technical-analysis engine for a sequential series of game-round
//! multipliers. The pipeline maps each multiplier to a category and score,
//! derives rolling momentum indicators and adaptive volatility bands,
//! extracts dominant and micro oscillation cycles via spectral analysis,
//! scores a multi-harmonic resonance model with a short coupled forecast,
//! retrieves historical analogues by sliding-window similarity search, and
//! fuses everything into one discrete recommendation.
//!
//! Every stage is a pure function of the full observation history plus the
//! configuration; [`session::Session`] adds the single-writer history,
//! content-hash memoization and explicit cache control on top.

pub mod analysis;
pub mod indicators;
pub mod session;
pub mod utilities;

pub use analysis::{analyze_rounds, AnalysisResult, AnalyzeError};
pub use indicators::score::{classify_round, Round, RoundCategory, ScoreError};
pub use session::{ConfigError, Session, SessionError, TrackerConfig};
