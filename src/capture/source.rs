use chrono::Utc;
use image::{DynamicImage, GenericImageView};
use serde::Deserialize;
use xcap::Monitor;

use crate::common::Frame;
use crate::error::CaptureError;

/// Blocking capture of one frame from a fixed screen region.
///
/// Implementations do not retry; every error is transient and the caller
/// decides whether the tick is dropped or the read is reattempted.
pub trait ScreenSource: Send + Sync {
    fn capture(&self) -> Result<Frame, CaptureError>;
}

/// Screen rectangle containing the board, in primary-monitor pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CaptureRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn validate(&self, screen_width: u32, screen_height: u32) -> Result<(), CaptureError> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::InvalidRegion(format!(
                "region {}x{} has no area",
                self.width, self.height
            )));
        }
        if self.x.saturating_add(self.width) > screen_width
            || self.y.saturating_add(self.height) > screen_height
        {
            return Err(CaptureError::InvalidRegion(format!(
                "region ({},{}) {}x{} exceeds screen {}x{}",
                self.x, self.y, self.width, self.height, screen_width, screen_height
            )));
        }
        Ok(())
    }
}

/// Cross-platform screenshot source backed by `xcap`.
///
/// Captures the primary monitor and crops to the configured board region.
/// On macOS the hosting terminal needs the Screen Recording permission.
pub struct XcapScreenSource {
    region: CaptureRegion,
}

impl XcapScreenSource {
    pub fn new(region: CaptureRegion) -> Self {
        Self { region }
    }

    pub fn region(&self) -> CaptureRegion {
        self.region
    }
}

impl ScreenSource for XcapScreenSource {
    fn capture(&self) -> Result<Frame, CaptureError> {
        let monitors = Monitor::all()
            .map_err(|e| CaptureError::Source(format!("failed to enumerate monitors: {e}")))?;
        let primary = monitors
            .into_iter()
            .next()
            .ok_or_else(|| CaptureError::Source("no monitors found".to_string()))?;
        let screenshot = primary
            .capture_image()
            .map_err(|e| CaptureError::Source(format!("monitor capture failed: {e}")))?;
        let screenshot = DynamicImage::ImageRgba8(screenshot);

        let (screen_width, screen_height) = screenshot.dimensions();
        if (screen_width, screen_height) == (0, 0) {
            return Err(CaptureError::Source(
                "captured empty screenshot, possible permission issue".to_string(),
            ));
        }
        self.region.validate(screen_width, screen_height)?;

        let cropped = screenshot.crop_imm(
            self.region.x,
            self.region.y,
            self.region.width,
            self.region.height,
        );
        Ok(Frame::new(cropped, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_must_fit_the_screen() {
        let region = CaptureRegion::new(100, 100, 480, 480);
        assert!(region.validate(1920, 1080).is_ok());
        assert!(matches!(
            region.validate(500, 500),
            Err(CaptureError::InvalidRegion(_))
        ));
    }

    #[test]
    fn empty_region_is_rejected() {
        let region = CaptureRegion::new(0, 0, 0, 480);
        assert!(matches!(
            region.validate(1920, 1080),
            Err(CaptureError::InvalidRegion(_))
        ));
    }

    #[test]
    #[ignore = "requires a display and screen recording permissions"]
    fn captures_the_configured_region() {
        let source = XcapScreenSource::new(CaptureRegion::new(0, 0, 64, 64));
        let frame = source.capture().expect("capture failed");
        assert_eq!(frame.image().dimensions(), (64, 64));
    }
}
