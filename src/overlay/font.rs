//! 3x5 bitmap glyphs for the indicator label: digits, `%`, `?` and `-`.

use image::Rgb;

use super::{fill_rect, Rect};
use crate::video::FrameBuf;

/// Glyph width in cells
pub const GLYPH_WIDTH: u32 = 3;

/// Glyph height in cells
pub const GLYPH_HEIGHT: u32 = 5;

/// Empty column between glyphs, in cells
const SPACING: u32 = 1;

/// Rows of a glyph, most significant of the low three bits is the left cell.
#[must_use]
pub fn glyph(c: char) -> Option<[u8; 5]> {
    let rows = match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '?' => [0b111, 0b001, 0b011, 0b000, 0b010],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        _ => return None,
    };
    Some(rows)
}

/// Pixel width of `text` at `scale`.
///
/// ```
/// use drone_hud::overlay::font::text_width;
///
/// assert_eq!(text_width("37%", 1), 11);
/// assert_eq!(text_width("", 2), 0);
/// ```
#[must_use]
pub fn text_width(text: &str, scale: u32) -> u32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    (chars * (GLYPH_WIDTH + SPACING) - SPACING) * scale
}

/// Draws `text` with its top-left corner at `(x, y)`, each cell a
/// `scale`-sized square. Characters without a glyph leave a gap.
pub fn draw_text(buf: &mut FrameBuf, x: u32, y: u32, text: &str, scale: u32, color: Rgb<u8>) {
    let scale = scale.max(1);
    let mut pen_x = x;

    for c in text.chars() {
        if let Some(rows) = glyph(c) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (0b100 >> col) != 0 {
                        let cell = Rect::new(
                            pen_x + col * scale,
                            y + row as u32 * scale,
                            scale,
                            scale,
                        );
                        fill_rect(buf, cell, color);
                    }
                }
            }
        }
        pen_x += (GLYPH_WIDTH + SPACING) * scale;
    }
}
