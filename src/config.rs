use std::path::Path;

use serde::Deserialize;

use crate::capture::source::CaptureRegion;
use crate::common::decision::ConfidenceThresholds;
use crate::error::AppError;
use crate::pipeline::encoding::InputEncoding;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Configuration {
    pub capture: CaptureConfig,
    pub board: BoardConfig,
    pub decision: DecisionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Screen rectangle containing the board.
    pub region: CaptureRegion,
    /// Capture cadence; one screen read is attempted per tick.
    pub target_fps: f64,
    /// Capacity of the capture -> swap queue. Kept small on purpose: when the
    /// swap task lags, new captures are dropped, not queued.
    pub frame_queue_size: usize,
    pub shutdown_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            region: CaptureRegion::new(200, 300, 480, 480),
            target_fps: 15.0,
            frame_queue_size: 2,
            shutdown_timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub rows: u32,
    pub cols: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self { rows: 8, cols: 8 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Decision cadence, independent of the capture cadence.
    pub target_fps: f64,
    /// Statistics are snapshotted every N decision ticks.
    pub stats_interval_ticks: u64,
    /// Ring-buffer capacity for retained decisions, oldest evicted first.
    pub history_size: usize,
    /// Bounded attempts for the blocking retry engine.
    pub max_capture_attempts: u32,
    pub retry_delay_ms: u64,
    /// Grayscale mean-absolute-difference above this counts as a change.
    pub change_threshold: f32,
    pub startup_timeout_ms: u64,
    pub thresholds: ConfidenceThresholds,
    pub encoding: InputEncoding,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            target_fps: 5.0,
            stats_interval_ticks: 10,
            history_size: 100,
            max_capture_attempts: 3,
            retry_delay_ms: 100,
            change_threshold: 0.05,
            startup_timeout_ms: 5_000,
            thresholds: ConfidenceThresholds::default(),
            encoding: InputEncoding::default(),
        }
    }
}

impl Configuration {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("failed to read config file: {e}")))?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("failed to parse config file: {e}")))
    }
}
