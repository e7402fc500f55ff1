//! # Overlay Module
//!
//! Telemetry-Overlay Pipeline: composites a battery indicator onto video
//! frames.
//!
//! This module handles:
//! - Bitmap glyphs for the numeric label
//! - Battery indicator layout, sized relative to the frame
//! - The renderer loop that resizes frames, draws the indicator and
//!   publishes the result

pub mod font;
pub mod indicator;
pub mod renderer;

use image::Rgb;

use crate::video::FrameBuf;

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// First column past the right edge.
    #[must_use]
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// First row past the bottom edge.
    #[must_use]
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Shrinks the rectangle by `by` pixels on every side, never below 1x1.
    #[must_use]
    pub fn inset(&self, by: u32) -> Self {
        let width = self.width.saturating_sub(2 * by).max(1);
        let height = self.height.saturating_sub(2 * by).max(1);
        Self::new(self.x + by.min(self.width / 2), self.y + by.min(self.height / 2), width, height)
    }
}

/// Fills `rect` with `color`, clipped to the buffer.
pub(crate) fn fill_rect(buf: &mut FrameBuf, rect: Rect, color: Rgb<u8>) {
    let x_end = rect.right().min(buf.width());
    let y_end = rect.bottom().min(buf.height());
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            buf.put_pixel(x, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_clips_to_buffer() {
        let mut buf = FrameBuf::new(10, 10);
        fill_rect(&mut buf, Rect::new(8, 8, 5, 5), Rgb([255, 0, 0]));
        assert_eq!(buf.get_pixel(9, 9).0, [255, 0, 0]);
        assert_eq!(buf.get_pixel(7, 7).0, [0, 0, 0]);
    }

    #[test]
    fn test_fill_rect_outside_is_noop() {
        let mut buf = FrameBuf::new(4, 4);
        fill_rect(&mut buf, Rect::new(20, 20, 5, 5), Rgb([255, 255, 255]));
        assert!(buf.as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_inset() {
        let rect = Rect::new(10, 20, 50, 22).inset(3);
        assert_eq!(rect, Rect::new(13, 23, 44, 16));
        assert!(rect.contains(13, 23));
        assert!(!rect.contains(57, 23));
    }

    #[test]
    fn test_inset_never_collapses() {
        let rect = Rect::new(0, 0, 4, 4).inset(5);
        assert_eq!(rect.width, 1);
        assert_eq!(rect.height, 1);
    }
}
