//! # Battery Indicator
//!
//! Geometry and drawing of the battery glyph.
//!
//! ```text
//!  margin_x
//!  |<->|
//!      +-----------------+
//!      | ██████████      |=|  37%
//!      +-----------------+
//!       body     bar     nub  label
//! ```
//!
//! Every size derives from the frame dimensions, so the indicator scales
//! with the display surface. The bar fills left to right in proportion to
//! the charge and changes colour by band:
//!
//! | Charge | Colour |
//! |--------|--------|
//! | >= 70 | Green |
//! | 40..=69 | Yellow |
//! | < 40 | Red |
//!
//! When the charge is unknown (no reading, or a stale one) the body turns
//! grey, the bar shows a `?` and the label reads `--%`.

use image::Rgb;
use serde::Deserialize;

use super::font::{self, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::{fill_rect, Rect};
use crate::video::FrameBuf;

/// Body and nub outline
pub const OUTLINE: Rgb<u8> = Rgb([255, 255, 255]);

/// Outline and glyphs in the unknown state
pub const UNKNOWN: Rgb<u8> = Rgb([128, 128, 128]);

/// Empty part of the bar
pub const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// Percentage label
pub const LABEL: Rgb<u8> = Rgb([255, 157, 43]);

pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);

/// Frame corner the indicator sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    #[default]
    TopLeft,
    BottomLeft,
}

/// What the indicator shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    /// Fresh charge reading, 0..=100
    Level(u8),
    /// No usable reading
    Unknown,
}

/// Bar colour for a charge level.
#[must_use]
pub fn bar_color(percent: u8) -> Rgb<u8> {
    match percent {
        70.. => GREEN,
        40..=69 => YELLOW,
        _ => RED,
    }
}

/// Filled columns of a bar `bar_width` wide at `percent`, rounded to the
/// nearest pixel.
///
/// ```
/// use drone_hud::overlay::indicator::filled_width;
///
/// assert_eq!(filled_width(100, 37), 37);
/// assert_eq!(filled_width(44, 100), 44);
/// assert_eq!(filled_width(44, 0), 0);
/// ```
#[must_use]
pub fn filled_width(bar_width: u32, percent: u8) -> u32 {
    let percent = u32::from(percent.min(100));
    (bar_width * percent + 50) / 100
}

/// Pixel geometry of the indicator for one frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorLayout {
    /// Battery outline, including the frame around the bar
    pub body: Rect,
    /// Terminal nub on the right of the body
    pub nub: Rect,
    /// Region the charge fills
    pub bar: Rect,
    /// Outline thickness
    pub border: u32,
    /// Top-left corner of the label
    pub label_x: u32,
    pub label_y: u32,
    /// Cell size of label glyphs
    pub label_scale: u32,
}

impl IndicatorLayout {
    /// Computes the layout for a `width` x `height` frame.
    ///
    /// ```
    /// use drone_hud::overlay::indicator::{Anchor, IndicatorLayout};
    ///
    /// let small = IndicatorLayout::for_frame(720, 480, Anchor::TopLeft);
    /// let large = IndicatorLayout::for_frame(1440, 960, Anchor::TopLeft);
    /// assert!(large.bar.width > small.bar.width);
    /// assert!(small.bar.right() <= small.body.right());
    /// ```
    #[must_use]
    pub fn for_frame(width: u32, height: u32, anchor: Anchor) -> Self {
        let body_w = (width * 7 / 100).max(12);
        let body_h = (height * 46 / 1000).max(6);
        let margin_x = width / 128 + 3;
        let margin_y = height / 11;

        let y = match anchor {
            Anchor::TopLeft => margin_y,
            Anchor::BottomLeft => height.saturating_sub(margin_y + body_h),
        };
        let body = Rect::new(margin_x, y, body_w, body_h);

        let border = (body_h / 11).max(1);
        // One pixel of background between outline and bar
        let bar = body.inset(border + 1);

        let nub_h = (body_h / 2).max(2);
        let nub = Rect::new(body.right(), y + (body_h - nub_h) / 2, (body_w / 16).max(2), nub_h);

        let label_scale = (body_h / 7).max(1);
        let label_x = nub.right() + (body_w / 10).max(2);
        let label_y = y + body_h.saturating_sub(GLYPH_HEIGHT * label_scale) / 2;

        Self {
            body,
            nub,
            bar,
            border,
            label_x,
            label_y,
            label_scale,
        }
    }

    /// Number of bar pixels filled at `percent`.
    #[must_use]
    pub fn filled_width(&self, percent: u8) -> u32 {
        filled_width(self.bar.width, percent)
    }
}

/// Draws the indicator onto `buf`.
pub fn draw(buf: &mut FrameBuf, layout: &IndicatorLayout, state: IndicatorState) {
    let outline = match state {
        IndicatorState::Level(_) => OUTLINE,
        IndicatorState::Unknown => UNKNOWN,
    };

    fill_rect(buf, layout.body, outline);
    fill_rect(buf, layout.body.inset(layout.border), BACKGROUND);
    fill_rect(buf, layout.nub, outline);

    match state {
        IndicatorState::Level(percent) => {
            let fill = Rect {
                width: layout.filled_width(percent),
                ..layout.bar
            };
            if fill.width > 0 {
                fill_rect(buf, fill, bar_color(percent));
            }
            let label = format!("{}%", percent.min(100));
            font::draw_text(buf, layout.label_x, layout.label_y, &label, layout.label_scale, LABEL);
        }
        IndicatorState::Unknown => {
            draw_unknown_glyph(buf, layout.bar);
            font::draw_text(buf, layout.label_x, layout.label_y, "--%", layout.label_scale, UNKNOWN);
        }
    }
}

/// Centres a `?` inside the bar region.
fn draw_unknown_glyph(buf: &mut FrameBuf, bar: Rect) {
    let scale = (bar.height / GLYPH_HEIGHT).max(1);
    let x = bar.x + bar.width.saturating_sub(GLYPH_WIDTH * scale) / 2;
    let y = bar.y + bar.height.saturating_sub(GLYPH_HEIGHT * scale) / 2;
    font::draw_text(buf, x, y, "?", scale, UNKNOWN);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(width: u32, height: u32, state: IndicatorState) -> (FrameBuf, IndicatorLayout) {
        let mut buf = FrameBuf::new(width, height);
        let layout = IndicatorLayout::for_frame(width, height, Anchor::TopLeft);
        draw(&mut buf, &layout, state);
        (buf, layout)
    }

    fn count_in(buf: &FrameBuf, rect: Rect, color: Rgb<u8>) -> u32 {
        let mut n = 0;
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                if *buf.get_pixel(x, y) == color {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn test_bar_color_bands() {
        assert_eq!(bar_color(100), GREEN);
        assert_eq!(bar_color(70), GREEN);
        assert_eq!(bar_color(69), YELLOW);
        assert_eq!(bar_color(40), YELLOW);
        assert_eq!(bar_color(39), RED);
        assert_eq!(bar_color(0), RED);
    }

    #[test]
    fn test_layout_720x480() {
        let layout = IndicatorLayout::for_frame(720, 480, Anchor::TopLeft);
        assert_eq!(layout.body, Rect::new(8, 43, 50, 22));
        assert_eq!(layout.border, 2);
        assert_eq!(layout.bar, Rect::new(11, 46, 44, 16));
        assert_eq!(layout.nub.x, layout.body.right());
        assert!(layout.label_x > layout.nub.right());
    }

    #[test]
    fn test_layout_bottom_left() {
        let layout = IndicatorLayout::for_frame(720, 480, Anchor::BottomLeft);
        assert_eq!(layout.body.bottom(), 480 - 480 / 11);
        assert_eq!(layout.body.x, 8);
    }

    #[test]
    fn test_layout_fits_smallest_frame() {
        let layout = IndicatorLayout::for_frame(64, 48, Anchor::BottomLeft);
        assert!(layout.bar.width >= 1);
        assert!(layout.body.bottom() <= 48);
        assert!(layout.nub.right() <= 64);
    }

    #[test]
    fn test_37_percent_fills_37_percent_of_bar() {
        let (buf, layout) = render(720, 480, IndicatorState::Level(37));
        let bar = layout.bar;
        let filled = count_in(&buf, bar, RED);

        let expected = layout.filled_width(37) * bar.height;
        assert_eq!(filled, expected);
        let fraction = filled as f32 / (bar.width * bar.height) as f32;
        assert!((fraction - 0.37).abs() <= 1.0 / bar.width as f32, "fraction {}", fraction);

        // Filled from the left edge
        assert_eq!(*buf.get_pixel(bar.x, bar.y), RED);
        assert_eq!(*buf.get_pixel(bar.right() - 1, bar.y), BACKGROUND);
    }

    #[test]
    fn test_full_and_empty() {
        let (buf, layout) = render(720, 480, IndicatorState::Level(100));
        assert_eq!(count_in(&buf, layout.bar, GREEN), layout.bar.width * layout.bar.height);

        let (buf, layout) = render(720, 480, IndicatorState::Level(0));
        for color in [GREEN, YELLOW, RED] {
            assert_eq!(count_in(&buf, layout.bar, color), 0);
        }
    }

    #[test]
    fn test_outline_and_label() {
        let (buf, layout) = render(720, 480, IndicatorState::Level(55));
        assert_eq!(*buf.get_pixel(layout.body.x, layout.body.y), OUTLINE);
        assert_eq!(*buf.get_pixel(layout.nub.x, layout.nub.y), OUTLINE);

        let label = Rect::new(
            layout.label_x,
            layout.label_y,
            font::text_width("55%", layout.label_scale),
            GLYPH_HEIGHT * layout.label_scale,
        );
        assert!(count_in(&buf, label, LABEL) > 0);
    }

    #[test]
    fn test_unknown_state() {
        let (buf, layout) = render(720, 480, IndicatorState::Unknown);
        for color in [GREEN, YELLOW, RED] {
            assert_eq!(count_in(&buf, layout.bar, color), 0);
        }
        // "?" glyph inside the bar
        assert!(count_in(&buf, layout.bar, UNKNOWN) > 0);
        assert_eq!(*buf.get_pixel(layout.body.x, layout.body.y), UNKNOWN);

        let label = Rect::new(
            layout.label_x,
            layout.label_y,
            font::text_width("--%", layout.label_scale),
            GLYPH_HEIGHT * layout.label_scale,
        );
        assert_eq!(count_in(&buf, label, LABEL), 0);
        assert!(count_in(&buf, label, UNKNOWN) > 0);
    }

    #[test]
    fn test_anchor_deserialize() {
        #[derive(Deserialize)]
        struct Holder {
            anchor: Anchor,
        }
        let holder: Holder = toml::from_str("anchor = \"bottom_left\"").unwrap();
        assert_eq!(holder.anchor, Anchor::BottomLeft);
        assert_eq!(Anchor::default(), Anchor::TopLeft);
    }
}
