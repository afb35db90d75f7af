//! End-to-end pipeline scenarios driven through the public session API.

use quantum_tracker::indicators::harmonic_cycle::PhaseLabel;
use quantum_tracker::indicators::tpi::SurgeReadout;
use quantum_tracker::{analyze_rounds, RoundCategory, Session, TrackerConfig};

fn alternating_session(rounds: usize) -> Session {
    let mut session = Session::with_defaults();
    for i in 0..rounds {
        let multiplier = if i % 2 == 0 { 1.5 } else { 3.0 };
        session.append_round(multiplier).expect("valid multiplier");
    }
    session
}

#[test]
fn alternating_rounds_resolve_cycle_two() {
    let mut session = alternating_session(25);
    let result = session.analyze().expect("analysis succeeds");

    // Blue/Purple alternation under pink_threshold = 10.
    for (i, cat) in result.categories.iter().enumerate() {
        let expected = if i % 2 == 0 {
            RoundCategory::Blue
        } else {
            RoundCategory::Purple
        };
        assert_eq!(*cat, expected, "category mismatch at round {}", i);
    }

    // An even MSI window over a perfect alternation sums to exactly zero.
    for i in 0..19 {
        assert!(result.msi[i].is_nan());
    }
    for i in 19..25 {
        assert_eq!(result.msi[i], 0.0);
    }
    assert_eq!(result.latest_msi, 0.0);
    assert_eq!(result.surge, SurgeReadout::TooSoft);

    assert_eq!(result.cycle.dominant_cycle, Some(2));
    assert_eq!(result.cycle.phase_position, Some(1));
    assert_eq!(result.cycle.wave_label, Some(PhaseLabel::Peak));

    // 25 rounds define MSI only from index 19; no 10-wide band window is
    // complete yet, so the band read-outs stay undefined.
    assert!(result.band_stats.bandwidth.is_none());
}

#[test]
fn analyze_twice_is_bit_identical() {
    let mut session = alternating_session(40);
    let config = *session.config();
    let rounds = session.rounds().to_vec();

    let a = analyze_rounds(&rounds, &config).expect("first run");
    let b = analyze_rounds(&rounds, &config).expect("second run");

    assert_eq!(a.msi.len(), b.msi.len());
    for (x, y) in a.msi.iter().zip(b.msi.iter()) {
        assert_eq!(x.to_bits(), y.to_bits());
    }
    for (x, y) in a
        .cycle
        .harmonic_forecast
        .iter()
        .zip(b.cycle.harmonic_forecast.iter())
    {
        assert_eq!(x.to_bits(), y.to_bits());
    }
    // The chain forecaster's jitter is seeded from the content hash, so
    // even the stochastic stage repeats exactly.
    assert_eq!(a.chain.branches.len(), b.chain.branches.len());
    for (ba, bb) in a.chain.branches.iter().zip(b.chain.branches.iter()) {
        for (sa, sb) in ba.iter().zip(bb.iter()) {
            assert_eq!(sa.value.to_bits(), sb.value.to_bits());
            assert_eq!(sa.label, sb.label);
        }
    }
    assert_eq!(a.decision.score, b.decision.score);
    assert_eq!(a.decision.banner, b.decision.banner);
}

#[test]
fn appending_changes_the_cached_result() {
    let mut session = alternating_session(30);
    let before = session.analyze().expect("analysis succeeds").msi.len();
    session.append_round(12.0).expect("valid multiplier");
    let after = session.analyze().expect("analysis succeeds");
    assert_eq!(after.msi.len(), before + 1);
    assert_eq!(
        *after.categories.last().expect("non-empty"),
        RoundCategory::Pink
    );
}

#[test]
fn result_serializes_for_the_presentation_layer() {
    let mut session = alternating_session(30);
    let result = session.analyze().expect("analysis succeeds");
    let json = serde_json::to_value(result).expect("serializable");
    assert!(json.get("msi").is_some());
    assert!(json.get("decision").is_some());
    assert!(json.get("cycle").is_some());
}

#[test]
fn threshold_change_reclassifies_everything() {
    let mut session = alternating_session(30);
    session.analyze().expect("analysis succeeds");

    let mut config = *session.config();
    config.pink_threshold = 2.0;
    session.set_config(config).expect("valid config");
    let result = session.analyze().expect("analysis succeeds");

    // pink_threshold = 2.0 collapses Purple: the 3.0 rounds become Pink.
    assert!(result
        .categories
        .iter()
        .all(|c| *c != RoundCategory::Purple));
    assert!(result
        .categories
        .iter()
        .any(|c| *c == RoundCategory::Pink));
}
