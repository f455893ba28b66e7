use image::GrayImage;

use crate::common::Frame;

/// Cheap frame-to-frame difference: grayscale mean absolute difference
/// against the last observed frame.
///
/// Runs in the decision path on demand, never in the hot capture loop. The
/// first observation primes the cache and reports no change.
pub struct ChangeDetector {
    previous: Option<GrayImage>,
    threshold: f32,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self {
            previous: None,
            threshold: 0.05,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Compare `frame` with the previous observation and cache it for the
    /// next call. Returns `(changed, diff_score)` with the score in `[0, 1]`.
    pub fn observe(&mut self, frame: &Frame) -> (bool, f32) {
        let current = frame.image().to_luma8();
        let result = match &self.previous {
            Some(previous) if previous.dimensions() == current.dimensions() => {
                let score = mean_absolute_difference(previous, &current);
                (score > self.threshold, score)
            }
            // First observation, or a dimension change after reconfiguration.
            _ => (false, 0.0),
        };
        self.previous = Some(current);
        result
    }
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn mean_absolute_difference(a: &GrayImage, b: &GrayImage) -> f32 {
    let total: u64 = a
        .pixels()
        .zip(b.pixels())
        .map(|(pa, pb)| pa.0[0].abs_diff(pb.0[0]) as u64)
        .sum();
    let pixel_count = (a.width() * a.height()) as f32;
    total as f32 / pixel_count / 255.0
}
