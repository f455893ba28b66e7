use std::sync::Arc;
use std::time::Duration;

use crate::capture::ScreenSource;
use crate::common::Decision;
use crate::config::DecisionConfig;
use crate::error::DecisionError;
use crate::pipeline::engine::{DecisionPipeline, EngineStatsSnapshot};
use crate::pipeline::extractor::BoardStateExtractor;
use crate::pipeline::model::PredictionModel;

/// Synchronous decision engine wrapping a blocking screen source directly,
/// for callers that skip the double-buffered core. Capture failures are
/// retried a bounded number of times with a fixed delay before giving up.
pub struct RetryingDecisionEngine {
    source: Arc<dyn ScreenSource>,
    pipeline: DecisionPipeline,
    max_attempts: u32,
    retry_delay: Duration,
}

impl RetryingDecisionEngine {
    pub fn new(
        source: Arc<dyn ScreenSource>,
        extractor: Box<dyn BoardStateExtractor>,
        model: Box<dyn PredictionModel>,
        config: &DecisionConfig,
    ) -> Self {
        Self {
            source,
            pipeline: DecisionPipeline::new(extractor, model, config),
            max_attempts: config.max_capture_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    pub fn make_decision(&self) -> Result<Decision, DecisionError> {
        let mut attempt = 0;
        let frame = loop {
            attempt += 1;
            match self.source.capture() {
                Ok(frame) => break frame,
                Err(e) => {
                    if attempt >= self.max_attempts {
                        // Only the final outcome counts as a failed capture.
                        self.pipeline.stats().record_failed_capture();
                        return Err(DecisionError::NoBoardState(e));
                    }
                    self.pipeline.stats().record_retried_capture();
                    tracing::debug!(
                        attempt,
                        "capture failed, retrying in {:?}: {e}",
                        self.retry_delay
                    );
                    std::thread::sleep(self.retry_delay);
                }
            }
        };
        self.pipeline.stats().record_successful_capture();
        self.pipeline.decide_from_frame(frame)
    }

    pub fn stats(&self) -> EngineStatsSnapshot {
        self.pipeline.stats().snapshot()
    }

    pub fn recent_decisions(&self) -> Vec<Decision> {
        self.pipeline.history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Frame, Grid};
    use crate::error::{CaptureError, ExtractionError, PredictionError};
    use chrono::Utc;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` captures, then succeeds.
    struct FlakySource {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakySource {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl ScreenSource for FlakySource {
        fn capture(&self) -> Result<Frame, CaptureError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(CaptureError::Source("flaky".to_string()));
            }
            Ok(Frame::new(
                DynamicImage::ImageRgb8(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(
                    64,
                    64,
                    Rgb([10, 10, 10]),
                )),
                Utc::now(),
            ))
        }
    }

    struct StubExtractor;

    impl BoardStateExtractor for StubExtractor {
        fn extract(&self, _frame: &Frame) -> Result<Grid, ExtractionError> {
            Ok(Grid::new(1, 2, vec![0.5, 0.5]))
        }
    }

    struct StubModel;

    impl PredictionModel for StubModel {
        fn predict(&self, _features: &[f32]) -> Result<Vec<f32>, PredictionError> {
            Ok(vec![0.7, 0.3])
        }
    }

    fn engine(failures: u32) -> RetryingDecisionEngine {
        let config = DecisionConfig {
            max_capture_attempts: 3,
            retry_delay_ms: 1,
            ..DecisionConfig::default()
        };
        RetryingDecisionEngine::new(
            Arc::new(FlakySource::new(failures)),
            Box::new(StubExtractor),
            Box::new(StubModel),
            &config,
        )
    }

    #[test]
    fn succeeds_on_the_third_attempt_counting_retries_not_failures() {
        let engine = engine(2);
        let decision = engine.make_decision().unwrap();
        assert_eq!(decision.top_move.index, 0);

        let stats = engine.stats();
        assert_eq!(stats.retried_captures, 2);
        assert_eq!(stats.failed_captures, 0);
        assert_eq!(stats.successful_captures, 1);
        assert_eq!(stats.total_decisions, 1);
    }

    #[test]
    fn exhausted_attempts_give_up_with_no_board_state() {
        let engine = engine(10);
        let result = engine.make_decision();
        assert!(matches!(
            result,
            Err(DecisionError::NoBoardState(CaptureError::Source(_)))
        ));

        let stats = engine.stats();
        assert_eq!(stats.retried_captures, 2);
        assert_eq!(stats.failed_captures, 1);
        assert_eq!(stats.total_decisions, 0);
    }

    #[test]
    fn immediate_success_records_no_retries() {
        let engine = engine(0);
        engine.make_decision().unwrap();
        assert_eq!(engine.stats().retried_captures, 0);
    }
}
