//! Tests for the balking policy
//!
//! Checks bracket boundaries and that a draw is consumed only when a bracket
//! applies.

use service_counter_simulator::counter::{estimated_wait, BalkBracket, BalkDecision, BalkingPolicy};
use service_counter_simulator::random::{SequenceCursor, UniformSequence, UniformStream};

fn stream(values: &[f64]) -> SequenceCursor {
    SequenceCursor::new(UniformSequence::new(values.to_vec()).unwrap())
}

/// Draw that sits just above a probability, so the customer stays
fn just_above(p: f64) -> f64 {
    p + 1e-9
}

#[test]
fn test_wait_below_fifteen_never_draws() {
    let policy = BalkingPolicy::default();
    let mut values = stream(&[0.0]);
    for wait in [0.0, 5.0, 14.999] {
        assert_eq!(policy.decide(wait, &mut values), BalkDecision::Stay);
    }
    assert_eq!(values.draws(), 0);
}

#[test]
fn test_bracket_probabilities_at_boundaries() {
    let policy = BalkingPolicy::default();
    let cases = [(15.0, 0.20), (19.999, 0.20), (20.0, 0.45), (24.999, 0.45), (25.0, 0.96)];

    for (wait, probability) in cases {
        // A draw equal to the probability balks, one just above it stays
        let mut at = stream(&[probability]);
        assert_eq!(policy.decide(wait, &mut at), BalkDecision::Balk, "wait {wait}");
        let mut above = stream(&[just_above(probability)]);
        assert_eq!(policy.decide(wait, &mut above), BalkDecision::Stay, "wait {wait}");
        assert_eq!(above.draws(), 1);
    }
}

#[test]
fn test_custom_brackets_are_sorted() {
    let policy = BalkingPolicy::new(vec![
        BalkBracket { threshold: 10.0, probability: 0.1 },
        BalkBracket { threshold: 30.0, probability: 1.0 },
    ]);
    assert_eq!(policy.brackets()[0].threshold, 30.0);
    assert_eq!(policy.bracket_for(12.0).unwrap().probability, 0.1);
    assert_eq!(policy.bracket_for(31.0).unwrap().probability, 1.0);
    assert!(policy.bracket_for(9.0).is_none());
}

#[test]
fn test_estimated_wait_uses_mean_service_for_queue() {
    // Idle server
    assert_eq!(estimated_wait(0, None, 42.0), 0.0);
    // One in service finishing in 6 minutes
    assert_eq!(estimated_wait(1, Some(48.0), 42.0), 6.0);
    // Two more waiting behind them
    assert_eq!(estimated_wait(3, Some(48.0), 42.0), 6.0 + 2.0 * 11.5);
    // Departure already due at this instant
    assert_eq!(estimated_wait(2, Some(42.0), 42.0), 11.5);
}
