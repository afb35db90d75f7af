//! # Decision Aggregator
//!
//! Deterministic point-scoring over the cycle detector, the resonance
//! engine and both pattern matchers, fused into one banner with itemized
//! reasons. Missing stage outputs are neutral: they add no points and no
//! reasons, never a penalty.

use crate::indicators::fractal::{MatchRecord, WindowMatch};
use crate::indicators::harmonic_cycle::{HarmonicCycleOutput, PhaseLabel};
use crate::indicators::resonance::ResonanceOutput;
use crate::indicators::score::RoundCategory;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Banner {
    EntryConfirmed,
    ScoutZone,
    HoldFire,
}

impl Banner {
    pub fn label(self) -> &'static str {
        match self {
            Banner::EntryConfirmed => "Entry Confirmed",
            Banner::ScoutZone => "Scout Zone",
            Banner::HoldFire => "Hold Fire",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionReason {
    pub points: i32,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutput {
    pub score: i32,
    pub banner: Banner,
    pub reasons: Vec<DecisionReason>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionInput<'a> {
    pub cycle: Option<&'a HarmonicCycleOutput>,
    pub resonance: Option<&'a ResonanceOutput>,
    pub pulse: Option<&'a WindowMatch>,
    pub anchor: Option<&'a MatchRecord>,
}

fn echo_points(record: &MatchRecord) -> Option<(i32, RoundCategory)> {
    let first = *record.continuation.first()?;
    let points = match first {
        RoundCategory::Pink => 2,
        RoundCategory::Purple => 1,
        RoundCategory::Blue => -1,
    };
    Some((points, first))
}

pub fn decide(input: &DecisionInput) -> DecisionOutput {
    let mut score = 0;
    let mut reasons = Vec::new();
    let mut push = |points: i32, reason: String, score: &mut i32| {
        *score += points;
        reasons.push(DecisionReason { points, reason });
    };

    if let Some(cycle) = input.cycle {
        if let Some(label) = cycle.wave_label {
            if matches!(label, PhaseLabel::Ascent | PhaseLabel::Peak) {
                push(
                    1,
                    format!("Dominant wave in {}", label.label()),
                    &mut score,
                );
            }
            if cycle.micro_label == Some(label) {
                push(
                    1,
                    "Micro wave phase-locked with dominant wave".to_string(),
                    &mut score,
                );
            }
        }
    }

    if let Some(res) = input.resonance {
        if res.coherence > 0.7 {
            push(
                1,
                format!("High harmonic coherence ({:.2})", res.coherence),
                &mut score,
            );
        } else if res.coherence < 0.4 {
            push(
                -1,
                format!("Low harmonic coherence ({:.2})", res.coherence),
                &mut score,
            );
        }
    }

    if let Some(pulse) = input.pulse {
        if let Some((points, category)) = echo_points(&pulse.record) {
            push(
                points,
                format!(
                    "Fractal Pulse echo (w={}) predicts {}",
                    pulse.window,
                    category.label()
                ),
                &mut score,
            );
        }
    }

    if let Some(anchor) = input.anchor {
        if let Some((points, category)) = echo_points(anchor) {
            push(
                points,
                format!("Fractal Anchor echo predicts {}", category.label()),
                &mut score,
            );
        }
    }

    let banner = if score >= 4 {
        Banner::EntryConfirmed
    } else if score >= 2 {
        Banner::ScoutZone
    } else {
        Banner::HoldFire
    };

    DecisionOutput {
        score,
        banner,
        reasons,
    }
}
