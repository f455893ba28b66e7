use std::cmp::Ordering;

use crate::common::{Confidence, ConfidenceThresholds, RankedMove};
use crate::error::DecisionError;

/// Turns a probability vector into an ordered, categorized, explained move
/// list. Deterministic: descending probability, ties broken by the lower
/// original index.
pub struct MoveRanker {
    thresholds: ConfidenceThresholds,
}

impl MoveRanker {
    pub fn new(thresholds: ConfidenceThresholds) -> Self {
        Self { thresholds }
    }

    pub fn rank(&self, probabilities: &[f32]) -> Result<Vec<RankedMove>, DecisionError> {
        if probabilities.is_empty()
            || probabilities.iter().all(|p| !p.is_finite() || *p <= 0.0)
        {
            return Err(DecisionError::NoValidMoves);
        }

        let mut indexed: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
        // Stable sort keeps the lower original index first on equal
        // probabilities; NaN entries compare equal and stay put.
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let total = indexed.len();
        Ok(indexed
            .into_iter()
            .enumerate()
            .map(|(position, (index, probability))| {
                let confidence = Confidence::from_probability(probability, &self.thresholds);
                RankedMove {
                    index,
                    probability,
                    confidence,
                    reasoning: format!(
                        "{:?}: probability {:.3}, rank {} of {}",
                        confidence,
                        probability,
                        position + 1,
                        total
                    ),
                }
            })
            .collect())
    }
}

impl Default for MoveRanker {
    fn default() -> Self {
        Self::new(ConfidenceThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_descending_by_probability() {
        let ranker = MoveRanker::default();
        let ranked = ranker.rank(&[0.1, 0.05, 0.6, 0.25]).unwrap();
        let order: Vec<usize> = ranked.iter().map(|m| m.index).collect();
        assert_eq!(order, vec![2, 3, 0, 1]);
        assert_eq!(ranked[0].probability, 0.6);
    }

    #[test]
    fn ties_break_on_the_lower_original_index() {
        let ranker = MoveRanker::default();
        let ranked = ranker.rank(&[0.3, 0.3]).unwrap();
        assert_eq!(ranked[0].index, 0);
        assert_eq!(ranked[1].index, 1);
    }

    #[test]
    fn categories_follow_the_configured_thresholds() {
        let ranker = MoveRanker::default();
        let ranked = ranker.rank(&[0.85, 0.65, 0.45, 0.25, 0.05]).unwrap();
        let categories: Vec<Confidence> = ranked.iter().map(|m| m.confidence).collect();
        assert_eq!(
            categories,
            vec![
                Confidence::Excellent,
                Confidence::Good,
                Confidence::Fair,
                Confidence::Risky,
                Confidence::Uncertain,
            ]
        );
    }

    #[test]
    fn empty_vector_has_no_valid_moves() {
        let ranker = MoveRanker::default();
        assert!(matches!(ranker.rank(&[]), Err(DecisionError::NoValidMoves)));
    }

    #[test]
    fn degenerate_vector_has_no_valid_moves() {
        let ranker = MoveRanker::default();
        assert!(matches!(
            ranker.rank(&[0.0, 0.0]),
            Err(DecisionError::NoValidMoves)
        ));
        assert!(matches!(
            ranker.rank(&[f32::NAN, f32::NEG_INFINITY]),
            Err(DecisionError::NoValidMoves)
        ));
    }

    #[test]
    fn reasoning_names_the_category_and_rank() {
        let ranker = MoveRanker::default();
        let ranked = ranker.rank(&[0.9, 0.1]).unwrap();
        assert!(ranked[0].reasoning.contains("Excellent"));
        assert!(ranked[0].reasoning.contains("rank 1 of 2"));
    }
}
