use chrono::{DateTime, Utc};
use image::{DynamicImage, RgbImage};
use uuid::Uuid;

/// One captured sample of the monitored screen region.
///
/// Cloning a `Frame` deep-copies the pixel buffer; a frame handed across the
/// buffer boundary is always owned by the receiver.
#[derive(Clone)]
pub struct Frame {
    image: DynamicImage,
    captured_at: DateTime<Utc>,
    frame_id: Uuid,
}

impl Frame {
    pub fn new(image: DynamicImage, captured_at: DateTime<Utc>) -> Self {
        Self {
            image,
            captured_at,
            frame_id: Uuid::new_v4(),
        }
    }

    /// An all-black frame used to pre-initialize buffer slots so there is
    /// never an uninitialized-slot state.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(
            DynamicImage::ImageRgb8(RgbImage::new(width, height)),
            Utc::now(),
        )
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn frame_id(&self) -> Uuid {
        self.frame_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageBuffer, Rgb};

    fn solid_frame(value: u8) -> Frame {
        Frame::new(
            DynamicImage::ImageRgb8(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(
                16,
                16,
                Rgb([value, value, value]),
            )),
            Utc::now(),
        )
    }

    #[test]
    fn cloning_frame_copies_pixels() {
        let f1 = solid_frame(7);
        let f2 = f1.clone();
        assert_eq!(f1.frame_id(), f2.frame_id());
        assert_eq!(f1.image().get_pixel(0, 0), f2.image().get_pixel(0, 0));
    }

    #[test]
    fn blank_frame_has_requested_dimensions() {
        let frame = Frame::blank(32, 24);
        assert_eq!(frame.image().dimensions(), (32, 24));
    }
}
