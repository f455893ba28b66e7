pub mod decision_loop;
pub mod encoding;
pub mod engine;
pub mod extractor;
pub mod model;
pub mod ranker;
pub mod retry;

pub use decision_loop::{DecisionLoop, LoopState, LoopStats};
pub use encoding::InputEncoding;
pub use engine::{DecisionEngine, EngineStats, EngineStatsSnapshot};
pub use extractor::{BoardStateExtractor, LuminanceGridExtractor};
pub use model::{PredictionModel, UniformFallbackModel};
pub use ranker::MoveRanker;
pub use retry::RetryingDecisionEngine;
