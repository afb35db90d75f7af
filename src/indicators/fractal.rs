//! # Fractal Pattern Matcher (Pulse / Anchor)
//!
//! Two structurally identical sliding-window matchers that compare the most
//! recent window against every historical window and echo the continuation
//! that followed the best match.
//!
//! - **Pulse**: categorical sequence + FFT magnitude of the window's score
//!   differences (spectral slope); tries windows {5, 8, 13}.
//! - **Anchor**: categorical sequence + raw MSI window shape; one
//!   configurable window (default 8).
//!
//! Combined score = `0.6 * cosine + 0.4 * category equality ratio`. The
//! first (lowest index) maximum wins under strict `>`. Both matchers
//! re-scan the entire history on every call; this O(N*w) pass is the
//! dominant cost of the pipeline on long histories.

use crate::indicators::score::RoundCategory;
use crate::utilities::helpers::cosine_similarity;
use crate::utilities::spectrum::rfft;
use serde::Serialize;

/// Rounds of continuation echoed after the matched window.
const ECHO_LEN: usize = 3;

/// Extra history demanded beyond the window itself.
const MIN_EXTRA: usize = 10;

const COSINE_WEIGHT: f64 = 0.6;
const CATEGORY_WEIGHT: f64 = 0.4;

/// Best-matching historical window and the categorical sequence that
/// followed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub start_index: usize,
    /// Similarity in [0, 1].
    pub score: f64,
    pub continuation: Vec<RoundCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowMatch {
    pub window: usize,
    pub record: MatchRecord,
}

fn equality_ratio(a: &[RoundCategory], b: &[RoundCategory]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    if a.is_empty() {
        return 0.0;
    }
    let matches = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    matches as f64 / a.len() as f64
}

/// Core scan shared by Pulse and Anchor. `feature` extracts the numeric
/// feature vector for the window starting at the given index; the current
/// window is the trailing one at `n - w`.
fn best_match<F>(categories: &[RoundCategory], window: usize, feature: F) -> Option<MatchRecord>
where
    F: Fn(usize) -> Vec<f64>,
{
    let n = categories.len();
    if window == 0 || n < window + MIN_EXTRA {
        return None;
    }
    let scan_end = n.checked_sub(window + ECHO_LEN)?;
    if scan_end == 0 {
        return None;
    }

    let current_start = n - window;
    let current_feature = feature(current_start);
    let current_cats = &categories[current_start..];

    let mut best: Option<MatchRecord> = None;
    for i in 0..scan_end {
        let hist_feature = feature(i);
        let cos = cosine_similarity(&current_feature, &hist_feature);
        let eq = equality_ratio(current_cats, &categories[i..i + window]);
        let score = COSINE_WEIGHT * cos + CATEGORY_WEIGHT * eq;
        let better = match &best {
            Some(record) => score > record.score,
            None => true,
        };
        if better {
            best = Some(MatchRecord {
                start_index: i,
                score,
                continuation: categories[i + window..i + window + ECHO_LEN].to_vec(),
            });
        }
    }
    best
}

/// Spectral-slope feature: FFT magnitudes of the score window's first
/// differences.
fn pulse_feature(scores: &[f64], start: usize, window: usize) -> Vec<f64> {
    let slice = &scores[start..start + window];
    let diffs: Vec<f64> = slice.windows(2).map(|w| w[1] - w[0]).collect();
    rfft(&diffs).iter().map(|c| c.norm()).collect()
}

/// Shape feature: the raw MSI window, with undefined warmup samples read
/// as 0 so early windows stay comparable.
fn anchor_feature(msi: &[f64], start: usize, window: usize) -> Vec<f64> {
    msi[start..start + window]
        .iter()
        .map(|v| if v.is_nan() { 0.0 } else { *v })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PulseParams {
    pub windows: Option<Vec<usize>>,
}

impl Default for PulseParams {
    fn default() -> Self {
        Self {
            windows: Some(vec![5, 8, 13]),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PulseInput<'a> {
    pub categories: &'a [RoundCategory],
    pub scores: &'a [f64],
    pub params: PulseParams,
}

impl<'a> PulseInput<'a> {
    pub fn new(categories: &'a [RoundCategory], scores: &'a [f64], params: PulseParams) -> Self {
        Self {
            categories,
            scores,
            params,
        }
    }

    pub fn with_default_params(categories: &'a [RoundCategory], scores: &'a [f64]) -> Self {
        Self {
            categories,
            scores,
            params: PulseParams::default(),
        }
    }

    fn get_windows(&self) -> Vec<usize> {
        self.params.windows.clone().unwrap_or_else(|| vec![5, 8, 13])
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PulseOutput {
    /// Per-window matches for windows with enough history.
    pub matches: Vec<WindowMatch>,
    /// Highest-scoring match across windows (first window wins ties).
    pub best: Option<WindowMatch>,
}

pub fn fractal_pulse(input: &PulseInput) -> PulseOutput {
    debug_assert_eq!(input.categories.len(), input.scores.len());
    let mut matches = Vec::new();
    for window in input.get_windows() {
        if let Some(record) = best_match(input.categories, window, |start| {
            pulse_feature(input.scores, start, window)
        }) {
            matches.push(WindowMatch { window, record });
        }
    }
    let mut best: Option<&WindowMatch> = None;
    for candidate in &matches {
        let better = match best {
            Some(current) => candidate.record.score > current.record.score,
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }
    let best = best.cloned();
    PulseOutput { matches, best }
}

#[derive(Debug, Clone)]
pub struct AnchorParams {
    pub window: Option<usize>,
}

impl Default for AnchorParams {
    fn default() -> Self {
        Self { window: Some(8) }
    }
}

#[derive(Debug, Clone)]
pub struct AnchorInput<'a> {
    pub categories: &'a [RoundCategory],
    pub msi: &'a [f64],
    pub params: AnchorParams,
}

impl<'a> AnchorInput<'a> {
    pub fn new(categories: &'a [RoundCategory], msi: &'a [f64], params: AnchorParams) -> Self {
        Self {
            categories,
            msi,
            params,
        }
    }

    pub fn with_default_params(categories: &'a [RoundCategory], msi: &'a [f64]) -> Self {
        Self {
            categories,
            msi,
            params: AnchorParams::default(),
        }
    }

    fn get_window(&self) -> usize {
        self.params.window.unwrap_or(8)
    }
}

/// None when the history is shorter than `window + 10`.
pub fn fractal_anchor(input: &AnchorInput) -> Option<MatchRecord> {
    debug_assert_eq!(input.categories.len(), input.msi.len());
    let window = input.get_window();
    best_match(input.categories, window, |start| {
        anchor_feature(input.msi, start, window)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::score::RoundCategory::{Blue, Pink, Purple};

    fn scores_for(categories: &[RoundCategory]) -> Vec<f64> {
        categories.iter().map(|c| c.score()).collect()
    }

    #[test]
    fn test_insufficient_history() {
        let categories = vec![Blue; 17]; // anchor needs 8 + 10
        let msi = vec![0.0; 17];
        assert!(fractal_anchor(&AnchorInput::with_default_params(&categories, &msi)).is_none());
    }

    #[test]
    fn test_planted_window_is_found() {
        // A distinctive 8-round motif planted at index 4 and repeated at the
        // tail; everything else is flat Blue so only the plant matches
        // exactly.
        let motif = [Pink, Blue, Purple, Purple, Blue, Pink, Blue, Purple];
        let mut categories = vec![Blue; 4];
        categories.extend_from_slice(&motif);
        let continuation = [Purple, Pink, Blue];
        categories.extend_from_slice(&continuation);
        categories.extend(vec![Blue; 10]);
        categories.extend_from_slice(&motif);
        let scores = scores_for(&categories);

        let out = fractal_pulse(&PulseInput::new(
            &categories,
            &scores,
            PulseParams {
                windows: Some(vec![8]),
            },
        ));
        let best = out.best.expect("match expected");
        assert_eq!(best.record.start_index, 4);
        assert!(
            best.record.score >= 0.99,
            "similarity {} too low",
            best.record.score
        );
        assert_eq!(best.record.continuation, continuation.to_vec());
    }

    #[test]
    fn test_anchor_planted_window() {
        let motif = [Pink, Blue, Purple, Purple, Blue, Pink, Blue, Purple];
        let mut categories = vec![Blue; 4];
        categories.extend_from_slice(&motif);
        categories.extend(vec![Blue; 13]);
        categories.extend_from_slice(&motif);
        let scores = scores_for(&categories);
        // MSI stand-in: rolling 4-sum of scores via the msi module.
        let msi = crate::indicators::msi::msi(&crate::indicators::msi::MsiInput::new(
            &scores,
            crate::indicators::msi::MsiParams { window: Some(4) },
        ))
        .unwrap()
        .values;

        let record =
            fractal_anchor(&AnchorInput::with_default_params(&categories, &msi)).unwrap();
        assert_eq!(record.continuation.len(), 3);
        assert!(record.score <= 1.0 + 1e-12 && record.score >= 0.0);
    }

    #[test]
    fn test_first_maximum_wins_ties() {
        // Uniform history: every window scores identically, so the scan's
        // strict comparison keeps index 0.
        let categories = vec![Purple; 40];
        let scores = scores_for(&categories);
        let out = fractal_pulse(&PulseInput::new(
            &categories,
            &scores,
            PulseParams {
                windows: Some(vec![5]),
            },
        ));
        assert_eq!(out.best.unwrap().record.start_index, 0);
    }

    #[test]
    fn test_scan_excludes_overlap_with_tail() {
        // scan_end = n - w - 3: the continuation of the last scanned window
        // never runs past the end of history.
        let categories = vec![Blue; 30];
        let scores = scores_for(&categories);
        let out = fractal_pulse(&PulseInput::new(
            &categories,
            &scores,
            PulseParams {
                windows: Some(vec![8]),
            },
        ));
        let matches = &out.matches;
        assert_eq!(matches.len(), 1);
        let record = &matches[0].record;
        assert!(record.start_index + 8 + 3 <= 30);
    }
}
