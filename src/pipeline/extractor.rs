use image::imageops::FilterType;
use image::GenericImageView;

use crate::common::{Frame, Grid};
use crate::error::ExtractionError;

/// Turns a captured frame into a normalized board grid.
///
/// Square segmentation and piece classification are pluggable behind this
/// trait; the engine only depends on the grid it produces.
pub trait BoardStateExtractor: Send + Sync {
    fn extract(&self, frame: &Frame) -> Result<Grid, ExtractionError>;
}

/// Baseline extractor: mean cell luminance, normalized to `[0, 1]`.
///
/// Downscales the frame so each grid cell averages its covered pixels. A
/// classifier-backed extractor plugs in behind the same trait.
pub struct LuminanceGridExtractor {
    rows: u32,
    cols: u32,
}

impl LuminanceGridExtractor {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }
}

impl BoardStateExtractor for LuminanceGridExtractor {
    fn extract(&self, frame: &Frame) -> Result<Grid, ExtractionError> {
        let (width, height) = frame.image().dimensions();
        if width < self.cols || height < self.rows {
            return Err(ExtractionError::FrameTooSmall {
                width,
                height,
                rows: self.rows,
                cols: self.cols,
            });
        }

        let cells: Vec<f32> = frame
            .image()
            .resize_exact(self.cols, self.rows, FilterType::Triangle)
            .to_luma8()
            .pixels()
            .map(|p| p.0[0] as f32 / 255.0)
            .collect();

        Ok(Grid::new(self.rows as usize, self.cols as usize, cells))
    }
}
