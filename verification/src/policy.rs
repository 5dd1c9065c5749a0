//! Accept/reject decision on an embedding distance.

use serde::{Deserialize, Serialize};

/// Distance below which two faces are taken to be the same person.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

/// Outcome of one comparison. `distance` is diagnostic only.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchDecision {
    pub accepted: bool,
    pub distance: f64,
}

/// Threshold policy: `accepted = distance < threshold`, so a distance equal
/// to the threshold is rejected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchPolicy {
    threshold: f64,
}

impl MatchPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn decide(&self, distance: f64) -> MatchDecision {
        MatchDecision {
            accepted: distance < self.threshold,
            distance,
        }
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_itself_rejects() {
        let policy = MatchPolicy::default();
        assert!(!policy.decide(0.6).accepted);
        assert!(policy.decide(0.599_999).accepted);
        assert!(!policy.decide(0.61).accepted);
    }

    #[test]
    fn threshold_can_be_overridden() {
        let strict = MatchPolicy::new(0.4);
        assert!(!strict.decide(0.45).accepted);
        assert!(MatchPolicy::default().decide(0.45).accepted);
    }

    #[test]
    fn nan_distance_never_accepts() {
        assert!(!MatchPolicy::default().decide(f64::NAN).accepted);
    }
}
