use std::time::Duration;

use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Capture Error: {0}")]
    Capture(#[from] CaptureError),
    #[error("Decision Error: {0}")]
    Decision(#[from] DecisionError),
    #[error("Config Error: {0}")]
    Config(String),
}

// Capture-side errors. Transient screen-read failures stay inside the capture
// core (counted, dropped); only the lifecycle and readiness variants cross it.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No frame has been captured yet.")]
    NotReady,
    #[error("Buffer did not become ready within {0:?}.")]
    ReadyTimeout(Duration),
    #[error("The capturer is already started.")]
    AlreadyStarted,
    #[error("Screen read failed: {0}")]
    Source(String),
    #[error("Invalid capture region: {0}")]
    InvalidRegion(String),
    #[error("Background tasks did not exit within {0:?}; resources were force-released.")]
    ShutdownTimeout(Duration),
}

#[derive(Error, Debug)]
pub enum DecisionError {
    #[error("No board state available: {0}")]
    NoBoardState(CaptureError),
    #[error("Prediction failed: {0}")]
    Prediction(#[from] PredictionError),
    #[error("Board extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("The model returned no valid moves.")]
    NoValidMoves,
}

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Model inference failed: {0}")]
    Inference(String),
    #[error("Model rejected input of {actual} features, expected {expected}.")]
    InvalidInput { expected: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Frame {width}x{height} is smaller than the {rows}x{cols} board grid.")]
    FrameTooSmall {
        width: u32,
        height: u32,
        rows: u32,
        cols: u32,
    },
}
