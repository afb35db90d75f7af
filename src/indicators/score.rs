//! # Score Mapper
//!
//! Classifies a raw round multiplier into a category and numeric score.
//!
//! ## Thresholds
//! - **Pink**: `multiplier >= pink_threshold` (score 2)
//! - **Purple**: `multiplier >= 2.0` (score 1)
//! - **Blue**: everything below 2.0 (score -1)
//!
//! Category and score are always derived together from the same threshold;
//! neither is ever cached against a stale `pink_threshold`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Derived round class; never stored, always recomputed from the multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundCategory {
    Pink,
    Purple,
    Blue,
}

impl RoundCategory {
    #[inline]
    pub fn score(self) -> f64 {
        match self {
            RoundCategory::Pink => 2.0,
            RoundCategory::Purple => 1.0,
            RoundCategory::Blue => -1.0,
        }
    }

    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            RoundCategory::Pink => "Pink",
            RoundCategory::Purple => "Purple",
            RoundCategory::Blue => "Blue",
        }
    }
}

/// One game round. Immutable once appended to a session history except
/// through an explicit tail replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub timestamp: DateTime<Utc>,
    pub multiplier: f64,
    pub score: f64,
}

impl Round {
    /// Re-derives the category from the stored multiplier. The score field
    /// and this category are only consistent when `pink_threshold` matches
    /// the one the round was classified with.
    #[inline]
    pub fn category(&self, pink_threshold: f64) -> RoundCategory {
        if self.multiplier >= pink_threshold {
            RoundCategory::Pink
        } else if self.multiplier >= 2.0 {
            RoundCategory::Purple
        } else {
            RoundCategory::Blue
        }
    }
}

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("score: Invalid multiplier {multiplier}; must be > 0.")]
    InvalidMultiplier { multiplier: f64 },
    #[error("score: Invalid pink threshold {threshold}; must be > 0.")]
    InvalidThreshold { threshold: f64 },
}

/// Maps a multiplier to `(category, score)`. Non-positive input is rejected
/// rather than silently mapped to Blue.
pub fn classify_round(
    multiplier: f64,
    pink_threshold: f64,
) -> Result<(RoundCategory, f64), ScoreError> {
    if !(pink_threshold > 0.0) {
        return Err(ScoreError::InvalidThreshold {
            threshold: pink_threshold,
        });
    }
    if !(multiplier > 0.0) {
        return Err(ScoreError::InvalidMultiplier { multiplier });
    }
    let category = if multiplier >= pink_threshold {
        RoundCategory::Pink
    } else if multiplier >= 2.0 {
        RoundCategory::Purple
    } else {
        RoundCategory::Blue
    };
    Ok((category, category.score()))
}
