//! Customer balking (abandonment) model
//!
//! An arriving customer looks at the line they were assigned to, estimates the
//! wait, and may leave without being served. Short waits never cost a draw.

use super::calendar::MEAN_SERVICE_MINUTES;
use crate::random::UniformStream;
use serde::{Deserialize, Serialize};

/// One row of the balking table: waits at or above `threshold` balk with `probability`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalkBracket {
    /// Lower bound of the bracket, in minutes (inclusive)
    pub threshold: f64,
    /// Probability that the customer leaves
    pub probability: f64,
}

/// Outcome of a balking evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalkDecision {
    /// Customer joins the line
    Stay,
    /// Customer leaves without being served
    Balk,
}

/// Estimated wait for a customer joining a server's line
///
/// Zero when the server is idle; otherwise the remaining service of the
/// customer at the counter plus a mean service time for everyone else in line.
pub fn estimated_wait(occupancy: usize, next_departure: Option<f64>, clock: f64) -> f64 {
    if occupancy == 0 {
        return 0.0;
    }
    let remaining = next_departure.map_or(0.0, |departure| (departure - clock).max(0.0));
    remaining + (occupancy - 1) as f64 * MEAN_SERVICE_MINUTES
}

/// Table-driven balking policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalkingPolicy {
    /// Brackets sorted by descending threshold
    brackets: Vec<BalkBracket>,
}

impl Default for BalkingPolicy {
    fn default() -> Self {
        Self::new(vec![
            BalkBracket { threshold: 15.0, probability: 0.20 },
            BalkBracket { threshold: 20.0, probability: 0.45 },
            BalkBracket { threshold: 25.0, probability: 0.96 },
        ])
    }
}

impl BalkingPolicy {
    /// Build a policy from brackets in any order
    pub fn new(mut brackets: Vec<BalkBracket>) -> Self {
        brackets.sort_by(|a, b| b.threshold.total_cmp(&a.threshold));
        Self { brackets }
    }

    /// The brackets, highest threshold first
    pub fn brackets(&self) -> &[BalkBracket] {
        &self.brackets
    }

    /// Bracket governing `wait`, if any
    pub fn bracket_for(&self, wait: f64) -> Option<BalkBracket> {
        self.brackets.iter().copied().find(|bracket| wait >= bracket.threshold)
    }

    /// Decide whether a customer facing `wait` minutes balks
    ///
    /// Draws exactly one value when a bracket applies and none otherwise;
    /// the customer balks iff the draw is `<=` the bracket probability.
    pub fn decide<S: UniformStream + ?Sized>(&self, wait: f64, stream: &mut S) -> BalkDecision {
        match self.bracket_for(wait) {
            None => BalkDecision::Stay,
            Some(bracket) => {
                if stream.next_uniform() <= bracket.probability {
                    BalkDecision::Balk
                } else {
                    BalkDecision::Stay
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{SequenceCursor, UniformSequence};

    fn cursor(values: &[f64]) -> SequenceCursor {
        SequenceCursor::new(UniformSequence::new(values.to_vec()).unwrap())
    }

    #[test]
    fn test_estimated_wait() {
        assert_eq!(estimated_wait(0, None, 10.0), 0.0);
        assert_eq!(estimated_wait(1, Some(19.0), 2.0), 17.0);
        assert_eq!(estimated_wait(2, Some(19.0), 5.0), 25.5);
        assert_eq!(estimated_wait(3, Some(4.0), 10.0), 23.0);
    }

    #[test]
    fn test_bracket_boundaries() {
        let policy = BalkingPolicy::default();
        assert_eq!(policy.bracket_for(14.999), None);
        assert_eq!(policy.bracket_for(15.0).unwrap().probability, 0.20);
        assert_eq!(policy.bracket_for(19.999).unwrap().probability, 0.20);
        assert_eq!(policy.bracket_for(20.0).unwrap().probability, 0.45);
        assert_eq!(policy.bracket_for(24.999).unwrap().probability, 0.45);
        assert_eq!(policy.bracket_for(25.0).unwrap().probability, 0.96);
        assert_eq!(policy.bracket_for(500.0).unwrap().probability, 0.96);
    }

    #[test]
    fn test_short_wait_consumes_no_draw() {
        let policy = BalkingPolicy::default();
        let mut stream = cursor(&[0.0, 0.5]);
        assert_eq!(policy.decide(14.999, &mut stream), BalkDecision::Stay);
        assert_eq!(stream.position(), 0);
    }

    #[test]
    fn test_draw_at_probability_balks() {
        let policy = BalkingPolicy::default();
        let mut stream = cursor(&[0.20, 0.2000001, 0.45, 0.97]);
        assert_eq!(policy.decide(15.0, &mut stream), BalkDecision::Balk);
        assert_eq!(policy.decide(15.0, &mut stream), BalkDecision::Stay);
        assert_eq!(policy.decide(20.0, &mut stream), BalkDecision::Balk);
        assert_eq!(policy.decide(25.0, &mut stream), BalkDecision::Stay);
        assert_eq!(stream.draws(), 4);
    }
}
