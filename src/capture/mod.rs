pub mod capturer;
pub mod change_detector;
pub mod double_buffer;
pub mod source;
pub mod stats;

pub use capturer::{DoubleBufferedCapturer, FrameAcquirer};
pub use change_detector::ChangeDetector;
pub use double_buffer::DoubleBuffer;
pub use source::{CaptureRegion, ScreenSource, XcapScreenSource};
pub use stats::{CaptureStats, CaptureStatsSnapshot};
