//! # Frames
//!
//! [`Frame`] is a finished, read-only RGB picture. Renderers compose into a
//! mutable [`FrameBuf`] and seal it with [`Frame::new`] before publishing;
//! once a frame sits in a [`SharedSlot`](crate::slot::SharedSlot) readers
//! only ever get `Arc<Frame>` handles to it.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Mutable RGB8 working buffer.
pub type FrameBuf = RgbImage;

/// Immutable RGB8 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    /// Seals a buffer into a frame.
    #[must_use]
    pub fn new(image: FrameBuf) -> Self {
        Self { image }
    }

    /// A frame filled with one colour.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self::new(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Colour at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the frame.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.image.get_pixel(x, y).0
    }

    /// Read-only view of the pixels.
    #[must_use]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Copies the frame into a working buffer of the given size, resampling
    /// if the dimensions differ.
    #[must_use]
    pub fn resized(&self, width: u32, height: u32) -> FrameBuf {
        if self.dimensions() == (width, height) {
            self.image.clone()
        } else {
            imageops::resize(&self.image, width, height, FilterType::Triangle)
        }
    }
}

impl From<FrameBuf> for Frame {
    fn from(image: FrameBuf) -> Self {
        Self::new(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_frame() {
        let frame = Frame::filled(4, 3, [0, 0, 0]);
        assert!(frame.image().as_raw().iter().all(|&b| b == 0));
        assert_eq!(frame.image().as_raw().len(), 4 * 3 * 3);
        assert_eq!(frame.dimensions(), (4, 3));
    }

    #[test]
    fn test_resized_changes_dimensions() {
        let frame = Frame::filled(960, 720, [10, 200, 30]);
        let buf = frame.resized(720, 480);
        assert_eq!(buf.dimensions(), (720, 480));
        // Uniform input stays uniform after resampling
        let px = buf.get_pixel(360, 240).0;
        for (got, want) in px.iter().zip([10u8, 200, 30]) {
            assert!(got.abs_diff(want) <= 1, "{:?}", px);
        }
    }

    #[test]
    fn test_resized_same_size_is_a_copy() {
        let mut image = RgbImage::new(8, 8);
        image.put_pixel(3, 5, Rgb([1, 2, 3]));
        let frame = Frame::new(image);

        let mut buf = frame.resized(8, 8);
        buf.put_pixel(3, 5, Rgb([9, 9, 9]));
        assert_eq!(frame.pixel(3, 5), [1, 2, 3]);
    }
}
