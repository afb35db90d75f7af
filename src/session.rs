//! Caller-owned session state: the round history, the live configuration
//! and the memoized analysis. No process-wide singletons; the session is
//! single-writer, single-reader, and every analysis is a pure function of
//! the full history plus configuration.

use crate::analysis::{analyze_rounds, content_hash, AnalysisResult, AnalyzeError};
use crate::indicators::score::{classify_round, Round, ScoreError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Externally supplied configuration scalars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// MSI/TPI rolling window, in [5, 100].
    pub window_size: usize,
    /// Category boundary for Pink rounds; must be positive.
    pub pink_threshold: f64,
    /// Recognized but never consumed by any computation. Kept so the
    /// presentation layer can round-trip it; do not invent behavior for it.
    pub strict_rtt: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            pink_threshold: 10.0,
            strict_rtt: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config: window_size {window_size} out of range [5, 100].")]
    WindowOutOfRange { window_size: usize },
    #[error("config: pink_threshold {pink_threshold} must be > 0.")]
    NonPositiveThreshold { pink_threshold: f64 },
}

impl TrackerConfig {
    /// Fails fast, before any analysis runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(5..=100).contains(&self.window_size) {
            return Err(ConfigError::WindowOutOfRange {
                window_size: self.window_size,
            });
        }
        if !(self.pink_threshold > 0.0) {
            return Err(ConfigError::NonPositiveThreshold {
                pink_threshold: self.pink_threshold,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session: {0}")]
    Score(#[from] ScoreError),
    #[error("session: replace_tail of {provided} rounds exceeds history length {history}.")]
    TailTooLong { provided: usize, history: usize },
}

/// One running session. Owns the full observation history exclusively; all
/// derived models are cache entries keyed by the content of
/// `(history, config)` and die with any change to either.
#[derive(Debug)]
pub struct Session {
    rounds: Vec<Round>,
    config: TrackerConfig,
    cache: Option<(u64, AnalysisResult)>,
}

impl Session {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rounds: Vec::new(),
            config,
            cache: None,
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            rounds: Vec::new(),
            config: TrackerConfig::default(),
            cache: None,
        }
    }

    #[inline]
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Classifies `multiplier` with the current pink threshold and appends
    /// it. Invalid input is rejected before it enters history.
    pub fn append_round(&mut self, multiplier: f64) -> Result<&Round, ScoreError> {
        let (_, score) = classify_round(multiplier, self.config.pink_threshold)?;
        self.rounds.push(Round {
            timestamp: Utc::now(),
            multiplier,
            score,
        });
        self.cache = None;
        Ok(self.rounds.last().expect("just pushed"))
    }

    /// Appends an already-built round (timestamps supplied by the caller,
    /// e.g. when replaying a log). The score is recomputed from the
    /// multiplier so it can never disagree with the current threshold.
    pub fn append_existing(&mut self, round: Round) -> Result<&Round, ScoreError> {
        let (_, score) = classify_round(round.multiplier, self.config.pink_threshold)?;
        self.rounds.push(Round { score, ..round });
        self.cache = None;
        Ok(self.rounds.last().expect("just pushed"))
    }

    /// Replaces the trailing `records.len()` rounds in place (manual
    /// correction of recent entries). Invalidates the whole cache.
    pub fn replace_tail(&mut self, records: Vec<Round>) -> Result<(), SessionError> {
        if records.len() > self.rounds.len() {
            return Err(SessionError::TailTooLong {
                provided: records.len(),
                history: self.rounds.len(),
            });
        }
        for round in &records {
            classify_round(round.multiplier, self.config.pink_threshold)?;
        }
        let start = self.rounds.len() - records.len();
        self.rounds.truncate(start);
        self.rounds.extend(records);
        self.cache = None;
        Ok(())
    }

    /// Swaps the configuration; any change invalidates the cached analysis.
    pub fn set_config(&mut self, config: TrackerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if config != self.config {
            self.cache = None;
        }
        self.config = config;
        Ok(())
    }

    /// Full reset: clears the history and the cache.
    pub fn reset(&mut self) {
        self.rounds.clear();
        self.cache = None;
    }

    /// Forces recomputation on the next `analyze` without a data change.
    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    /// Runs (or returns the memoized) full-pipeline analysis.
    pub fn analyze(&mut self) -> Result<&AnalysisResult, AnalyzeError> {
        let key = content_hash(&self.rounds, &self.config);
        let hit = matches!(&self.cache, Some((cached_key, _)) if *cached_key == key);
        if !hit {
            let result = analyze_rounds(&self.rounds, &self.config)?;
            self.cache = Some((key, result));
        }
        Ok(&self.cache.as_ref().expect("cache populated above").1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::score::RoundCategory;

    #[test]
    fn test_config_validation() {
        assert!(TrackerConfig::default().validate().is_ok());
        assert!(matches!(
            TrackerConfig {
                window_size: 4,
                ..TrackerConfig::default()
            }
            .validate(),
            Err(ConfigError::WindowOutOfRange { .. })
        ));
        assert!(matches!(
            TrackerConfig {
                window_size: 101,
                ..TrackerConfig::default()
            }
            .validate(),
            Err(ConfigError::WindowOutOfRange { .. })
        ));
        assert!(matches!(
            TrackerConfig {
                pink_threshold: 0.0,
                ..TrackerConfig::default()
            }
            .validate(),
            Err(ConfigError::NonPositiveThreshold { .. })
        ));
    }

    #[test]
    fn test_append_classifies_and_rejects() {
        let mut session = Session::with_defaults();
        let round = session.append_round(12.5).unwrap();
        assert_eq!(round.score, 2.0);
        assert_eq!(round.category(10.0), RoundCategory::Pink);
        assert!(session.append_round(0.0).is_err());
        assert_eq!(session.rounds().len(), 1);
    }

    #[test]
    fn test_replace_tail() {
        let mut session = Session::with_defaults();
        for m in [1.5, 2.5, 3.5, 11.0] {
            session.append_round(m).unwrap();
        }
        let mut tail: Vec<Round> = session.rounds()[2..].to_vec();
        tail[0].multiplier = 1.2;
        tail[0].score = -1.0;
        session.replace_tail(tail).unwrap();
        assert_eq!(session.rounds().len(), 4);
        assert_eq!(session.rounds()[2].multiplier, 1.2);

        let too_long: Vec<Round> = session.rounds().to_vec();
        let mut extended = too_long.clone();
        extended.extend(too_long);
        assert!(matches!(
            session.replace_tail(extended),
            Err(SessionError::TailTooLong { .. })
        ));
    }

    #[test]
    fn test_cache_invalidation() {
        let mut session = Session::with_defaults();
        for i in 0..30 {
            session
                .append_round(if i % 2 == 0 { 1.5 } else { 3.0 })
                .unwrap();
        }
        let first_ptr = {
            let result = session.analyze().unwrap();
            result as *const AnalysisResult
        };
        // Same history and config: the cached entry is returned.
        let second_ptr = {
            let result = session.analyze().unwrap();
            result as *const AnalysisResult
        };
        assert_eq!(first_ptr, second_ptr);

        // A new round invalidates.
        session.append_round(2.0).unwrap();
        let after_append = session.analyze().unwrap();
        assert_eq!(after_append.msi.len(), 31);

        // A config change invalidates.
        let mut config = *session.config();
        config.pink_threshold = 2.5;
        session.set_config(config).unwrap();
        let after_config = session.analyze().unwrap();
        assert!(after_config
            .categories
            .iter()
            .any(|c| *c == RoundCategory::Pink));
    }

    #[test]
    fn test_clear_cache_forces_recompute() {
        let mut session = Session::with_defaults();
        for _ in 0..12 {
            session.append_round(2.0).unwrap();
        }
        session.analyze().unwrap();
        session.clear_cache();
        // Recomputation must succeed and agree with the previous run.
        let result = session.analyze().unwrap();
        assert_eq!(result.msi.len(), 12);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut session = Session::with_defaults();
        session.append_round(5.0).unwrap();
        session.reset();
        assert!(session.rounds().is_empty());
        let result = session.analyze().unwrap();
        assert!(result.msi.is_empty());
    }
}
