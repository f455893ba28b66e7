use crate::error::PredictionError;

/// Prediction model contract: encoded board features in, one probability per
/// move out. Synchronous; expected to dominate per-cycle CPU cost, so the
/// core never runs two predictions concurrently.
pub trait PredictionModel: Send + Sync {
    fn predict(&self, features: &[f32]) -> Result<Vec<f32>, PredictionError>;
}

/// Fallback used when no trained model is wired in: a uniform distribution
/// over the move space, so every suggestion ranks equal.
pub struct UniformFallbackModel {
    move_count: usize,
}

impl UniformFallbackModel {
    pub fn new(move_count: usize) -> Self {
        Self { move_count }
    }
}

impl PredictionModel for UniformFallbackModel {
    fn predict(&self, _features: &[f32]) -> Result<Vec<f32>, PredictionError> {
        if self.move_count == 0 {
            return Err(PredictionError::Inference(
                "fallback model configured with an empty move space".to_string(),
            ));
        }
        Ok(vec![1.0 / self.move_count as f32; self.move_count])
    }
}
