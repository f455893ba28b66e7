use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters mutated only by the capture tasks and read concurrently by
/// reporting. Owned by the capturer instance; no ambient global state.
#[derive(Debug, Default)]
pub struct CaptureStats {
    total_captures: AtomicU64,
    total_errors: AtomicU64,
    dropped_frames: AtomicU64,
    last_capture_us: AtomicU64,
    cumulative_capture_us: AtomicU64,
}

impl CaptureStats {
    pub fn record_capture(&self, duration: Duration) {
        let micros = duration.as_micros() as u64;
        self.total_captures.fetch_add(1, Ordering::Relaxed);
        self.last_capture_us.store(micros, Ordering::Relaxed);
        self.cumulative_capture_us.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CaptureStatsSnapshot {
        let total_captures = self.total_captures.load(Ordering::Relaxed);
        let cumulative_us = self.cumulative_capture_us.load(Ordering::Relaxed);
        let avg_capture_ms = if total_captures > 0 {
            cumulative_us as f64 / total_captures as f64 / 1_000.0
        } else {
            0.0
        };
        CaptureStatsSnapshot {
            total_captures,
            total_errors: self.total_errors.load(Ordering::Relaxed),
            dropped_frames: self.dropped_frames.load(Ordering::Relaxed),
            last_capture_ms: self.last_capture_us.load(Ordering::Relaxed) as f64 / 1_000.0,
            avg_capture_ms,
        }
    }
}

/// Point-in-time copy of the capture counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureStatsSnapshot {
    pub total_captures: u64,
    pub total_errors: u64,
    pub dropped_frames: u64,
    pub last_capture_ms: f64,
    pub avg_capture_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_over_three_captures_is_exact() {
        let stats = CaptureStats::default();
        stats.record_capture(Duration::from_millis(10));
        stats.record_capture(Duration::from_millis(20));
        stats.record_capture(Duration::from_millis(30));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_captures, 3);
        assert_eq!(snapshot.avg_capture_ms, 20.0);
        assert_eq!(snapshot.last_capture_ms, 30.0);
    }

    #[test]
    fn errors_and_drops_do_not_affect_the_average() {
        let stats = CaptureStats::default();
        stats.record_capture(Duration::from_millis(10));
        stats.record_error();
        stats.record_error();
        stats.record_dropped();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_errors, 2);
        assert_eq!(snapshot.dropped_frames, 1);
        assert_eq!(snapshot.avg_capture_ms, 10.0);
    }

    #[test]
    fn empty_stats_report_zero_average() {
        assert_eq!(CaptureStats::default().snapshot().avg_capture_ms, 0.0);
    }
}
