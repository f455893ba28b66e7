use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::capture::{ChangeDetector, FrameAcquirer};
use crate::common::{BoardState, Decision, Frame};
use crate::config::DecisionConfig;
use crate::error::DecisionError;
use crate::pipeline::encoding::InputEncoding;
use crate::pipeline::extractor::BoardStateExtractor;
use crate::pipeline::model::PredictionModel;
use crate::pipeline::ranker::MoveRanker;

/// Cumulative engine counters; mutated by decision cycles, read concurrently
/// by reporting.
#[derive(Debug, Default)]
pub struct EngineStats {
    total_decisions: AtomicU64,
    successful_captures: AtomicU64,
    failed_captures: AtomicU64,
    retried_captures: AtomicU64,
    total_inference_us: AtomicU64,
}

impl EngineStats {
    pub fn record_decision(&self) {
        self.total_decisions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_successful_capture(&self) {
        self.successful_captures.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts final capture outcomes only; intermediate retry attempts go
    /// through `record_retried_capture`.
    pub fn record_failed_capture(&self) {
        self.failed_captures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retried_capture(&self) {
        self.retried_captures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inference(&self, latency: Duration) {
        self.total_inference_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EngineStatsSnapshot {
        let total_decisions = self.total_decisions.load(Ordering::Relaxed);
        let total_inference_us = self.total_inference_us.load(Ordering::Relaxed);
        let avg_inference_ms = if total_decisions > 0 {
            total_inference_us as f64 / total_decisions as f64 / 1_000.0
        } else {
            0.0
        };
        EngineStatsSnapshot {
            total_decisions,
            successful_captures: self.successful_captures.load(Ordering::Relaxed),
            failed_captures: self.failed_captures.load(Ordering::Relaxed),
            retried_captures: self.retried_captures.load(Ordering::Relaxed),
            total_inference_ms: total_inference_us as f64 / 1_000.0,
            avg_inference_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineStatsSnapshot {
    pub total_decisions: u64,
    pub successful_captures: u64,
    pub failed_captures: u64,
    pub retried_captures: u64,
    pub total_inference_ms: f64,
    pub avg_inference_ms: f64,
}

/// The frame -> decision cycle shared by the buffered and the retrying
/// engines: change detection, extraction, encoding, timed inference, ranking,
/// history, statistics.
pub(crate) struct DecisionPipeline {
    extractor: Box<dyn BoardStateExtractor>,
    model: Box<dyn PredictionModel>,
    ranker: MoveRanker,
    encoding: InputEncoding,
    change_detector: Mutex<ChangeDetector>,
    stats: EngineStats,
    history: Mutex<VecDeque<Decision>>,
    history_size: usize,
}

impl DecisionPipeline {
    pub(crate) fn new(
        extractor: Box<dyn BoardStateExtractor>,
        model: Box<dyn PredictionModel>,
        config: &DecisionConfig,
    ) -> Self {
        Self {
            extractor,
            model,
            ranker: MoveRanker::new(config.thresholds),
            encoding: config.encoding.clone(),
            change_detector: Mutex::new(
                ChangeDetector::new().with_threshold(config.change_threshold),
            ),
            stats: EngineStats::default(),
            history: Mutex::new(VecDeque::with_capacity(config.history_size.max(1))),
            history_size: config.history_size.max(1),
        }
    }

    pub(crate) fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub(crate) fn history(&self) -> Vec<Decision> {
        self.history.lock().unwrap().iter().cloned().collect()
    }

    pub(crate) fn decide_from_frame(&self, frame: Frame) -> Result<Decision, DecisionError> {
        let (changed, diff_score) = self.change_detector.lock().unwrap().observe(&frame);
        let grid = self.extractor.extract(&frame)?;
        let board = BoardState::new(grid, changed, diff_score, frame.captured_at());

        let features = self.encoding.encode(&board.grid);
        let started = Instant::now();
        let probabilities = self.model.predict(&features)?;
        let inference_latency = started.elapsed();
        self.stats.record_inference(inference_latency);

        let mut ranked = self.ranker.rank(&probabilities)?;
        let top_move = ranked.remove(0);
        let decision = Decision {
            top_move,
            alternatives: ranked,
            inference_latency,
            decided_at: Utc::now(),
            board,
        };

        self.push_history(decision.clone());
        self.stats.record_decision();
        Ok(decision)
    }

    fn push_history(&self, decision: Decision) {
        let mut history = self.history.lock().unwrap();
        if history.len() >= self.history_size {
            history.pop_front();
        }
        history.push_back(decision);
    }
}

/// Runs one acquire -> predict -> rank cycle per call against the
/// double-buffered capture core. Acquisition never blocks.
pub struct DecisionEngine {
    acquirer: Arc<dyn FrameAcquirer>,
    pipeline: DecisionPipeline,
}

impl DecisionEngine {
    pub fn new(
        acquirer: Arc<dyn FrameAcquirer>,
        extractor: Box<dyn BoardStateExtractor>,
        model: Box<dyn PredictionModel>,
        config: &DecisionConfig,
    ) -> Self {
        Self {
            acquirer,
            pipeline: DecisionPipeline::new(extractor, model, config),
        }
    }

    pub fn make_decision(&self) -> Result<Decision, DecisionError> {
        let frame = match self.acquirer.latest_frame() {
            Ok(frame) => frame,
            Err(e) => {
                // Never fabricate a decision from a missing frame.
                self.pipeline.stats().record_failed_capture();
                return Err(DecisionError::NoBoardState(e));
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
    use crate::common::{Confidence, Grid};
    use crate::error::{CaptureError, ExtractionError, PredictionError};
    use chrono::Utc;
    use image::{DynamicImage, ImageBuffer, Rgb};

    struct StubAcquirer {
        ready: bool,
    }

    impl FrameAcquirer for StubAcquirer {
        fn latest_frame(&self) -> Result<Frame, CaptureError> {
            if !self.ready {
                return Err(CaptureError::NotReady);
            }
            Ok(Frame::new(
                DynamicImage::ImageRgb8(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(
                    64,
                    64,
                    Rgb([128, 128, 128]),
                )),
                Utc::now(),
            ))
        }
    }

    struct StubExtractor;

    impl BoardStateExtractor for StubExtractor {
        fn extract(&self, _frame: &Frame) -> Result<Grid, ExtractionError> {
            Ok(Grid::new(2, 2, vec![0.1, 0.2, 0.3, 0.4]))
        }
    }

    struct StubModel {
        probabilities: Vec<f32>,
        should_fail: bool,
    }

    impl PredictionModel for StubModel {
        fn predict(&self, _features: &[f32]) -> Result<Vec<f32>, PredictionError> {
            if self.should_fail {
                return Err(PredictionError::Inference("stub failure".to_string()));
            }
            Ok(self.probabilities.clone())
        }
    }

    fn engine(ready: bool, probabilities: Vec<f32>, should_fail: bool) -> DecisionEngine {
        let config = DecisionConfig {
            history_size: 2,
            ..DecisionConfig::default()
        };
        DecisionEngine::new(
            Arc::new(StubAcquirer { ready }),
            Box::new(StubExtractor),
            Box::new(StubModel {
                probabilities,
                should_fail,
            }),
            &config,
        )
    }

    #[test]
    fn successful_cycle_produces_a_ranked_decision() {
        let engine = engine(true, vec![0.1, 0.05, 0.6, 0.25], false);
        let decision = engine.make_decision().unwrap();

        assert_eq!(decision.top_move.index, 2);
        assert_eq!(decision.top_move.confidence, Confidence::Good);
        let alternatives: Vec<usize> = decision.alternatives.iter().map(|m| m.index).collect();
        assert_eq!(alternatives, vec![3, 0, 1]);

        let stats = engine.stats();
        assert_eq!(stats.total_decisions, 1);
        assert_eq!(stats.successful_captures, 1);
        assert_eq!(stats.failed_captures, 0);
    }

    #[test]
    fn capture_failure_yields_no_board_state() {
        let engine = engine(false, vec![0.5, 0.5], false);
        let result = engine.make_decision();
        assert!(matches!(
            result,
            Err(DecisionError::NoBoardState(CaptureError::NotReady))
        ));
        let stats = engine.stats();
        assert_eq!(stats.failed_captures, 1);
        assert_eq!(stats.total_decisions, 0);
    }

    #[test]
    fn prediction_failure_propagates_without_retry() {
        let engine = engine(true, vec![], true);
        assert!(matches!(
            engine.make_decision(),
            Err(DecisionError::Prediction(_))
        ));
        let stats = engine.stats();
        assert_eq!(stats.total_decisions, 0);
        assert_eq!(stats.successful_captures, 1);
    }

    #[test]
    fn history_is_a_bounded_ring() {
        let engine = engine(true, vec![0.2, 0.8], false);
        for _ in 0..5 {
            engine.make_decision().unwrap();
        }
        let history = engine.recent_decisions();
        assert_eq!(history.len(), 2);
        assert_eq!(engine.stats().total_decisions, 5);
    }

    #[test]
    fn first_cycle_reports_no_board_change() {
        let engine = engine(true, vec![0.2, 0.8], false);
        let decision = engine.make_decision().unwrap();
        assert!(!decision.board.changed);
        assert_eq!(decision.board.diff_score, 0.0);
        // Identical frames keep the score at zero afterwards.
        let next = engine.make_decision().unwrap();
        assert_eq!(next.board.diff_score, 0.0);
    }
}
