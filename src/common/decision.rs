use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::common::board::BoardState;

/// Ordinal confidence scale for a suggested move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    Excellent,
    Good,
    Fair,
    Risky,
    Uncertain,
}

/// Probability cut-offs for the confidence scale. The defaults come from the
/// original tuning and are configurable rather than asserted optimal.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    pub excellent: f32,
    pub good: f32,
    pub fair: f32,
    pub risky: f32,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            excellent: 0.80,
            good: 0.60,
            fair: 0.40,
            risky: 0.20,
        }
    }
}

impl Confidence {
    pub fn from_probability(probability: f32, thresholds: &ConfidenceThresholds) -> Self {
        if probability >= thresholds.excellent {
            Confidence::Excellent
        } else if probability >= thresholds.good {
            Confidence::Good
        } else if probability >= thresholds.fair {
            Confidence::Fair
        } else if probability >= thresholds.risky {
            Confidence::Risky
        } else {
            Confidence::Uncertain
        }
    }
}

/// One move suggestion: where it ranks, how likely the model thinks it is,
/// and a short human-readable justification.
#[derive(Debug, Clone)]
pub struct RankedMove {
    pub index: usize,
    pub probability: f32,
    pub confidence: Confidence,
    pub reasoning: String,
}

/// One ranked set of move suggestions derived from a single board state.
#[derive(Debug, Clone)]
pub struct Decision {
    pub top_move: RankedMove,
    pub alternatives: Vec<RankedMove>,
    pub inference_latency: Duration,
    pub decided_at: DateTime<Utc>,
    pub board: BoardState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive_lower_bounds() {
        let t = ConfidenceThresholds::default();
        assert_eq!(Confidence::from_probability(0.80, &t), Confidence::Excellent);
        assert_eq!(Confidence::from_probability(0.79, &t), Confidence::Good);
        assert_eq!(Confidence::from_probability(0.60, &t), Confidence::Good);
        assert_eq!(Confidence::from_probability(0.40, &t), Confidence::Fair);
        assert_eq!(Confidence::from_probability(0.20, &t), Confidence::Risky);
        assert_eq!(Confidence::from_probability(0.19, &t), Confidence::Uncertain);
    }
}
