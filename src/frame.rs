//! Frame container for input to the tracker.

use image::{Rgb, RgbImage};

use crate::{Error, Result};

/// A 3-channel, 8-bit image consumed read-only by one tracking cycle.
///
/// Channel order is whatever the producer stored; the appearance model only
/// requires that the first frame and later frames agree.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn from_rgb_image(image: RgbImage) -> Self {
        Self { image }
    }

    /// Create a frame from interleaved row-major pixel data (`width * height * 3` bytes).
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(Error::InvalidFrame(format!(
                "buffer length {} doesn't match {}x{}x3",
                data.len(),
                width,
                height
            )));
        }
        RgbImage::from_raw(width, height, data)
            .map(Self::from_rgb_image)
            .ok_or_else(|| Error::InvalidFrame("pixel buffer too small".to_string()))
    }

    /// A frame where every pixel has the same color.
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self::from_rgb_image(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel at column `x`, row `y`. Panics if out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.image.get_pixel(x, y).0
    }

    /// Overwrite the rectangle `[x0, x1) x [y0, y1)` (clamped to the frame) with `color`.
    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: [u8; 3]) {
        for y in y0..y1.min(self.height()) {
            for x in x0..x1.min(self.width()) {
                self.image.put_pixel(x, y, Rgb(color));
            }
        }
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        Self::from_rgb_image(image)
    }
}
