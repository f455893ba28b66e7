pub mod capture;
pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod pipeline;

pub use config::Configuration;
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use error::{AppError, CaptureError, DecisionError};

pub use capture::{DoubleBufferedCapturer, ScreenSource, XcapScreenSource};
pub use common::{Decision, Frame};
pub use pipeline::{DecisionEngine, DecisionLoop, RetryingDecisionEngine};
