pub mod board;
pub mod decision;
pub mod frame;

pub use board::{BoardState, Grid};
pub use decision::{Confidence, ConfidenceThresholds, Decision, RankedMove};
pub use frame::Frame;
