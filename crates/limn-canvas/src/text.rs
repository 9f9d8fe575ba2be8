//! 8x8 bitmap text with a one-pixel outline.

use font8x8::{UnicodeFonts, BASIC_FONTS};

use crate::surface::{Color, Surface};

/// Pixel scale applied to the 8x8 glyphs.
const GLYPH_SCALE: i64 = 2;

/// Glyph cell size after scaling.
pub const GLYPH_SIZE: i64 = 8 * GLYPH_SCALE;

/// Draw `text` with its baseline at (x, y): orange fill over a one-pixel
/// black outline. Characters outside the basic font map render as blanks.
pub fn draw_text(surface: &mut Surface, text: &str, x: f64, y: f64) {
    let origin_x = x.round() as i64;
    let origin_y = y.round() as i64 - GLYPH_SIZE;

    // Outline pass first so the fill stays on top where glyphs touch.
    for (dx, dy) in [
        (-1, -1),
        (0, -1),
        (1, -1),
        (-1, 0),
        (1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ] {
        draw_glyph_run(surface, text, origin_x + dx, origin_y + dy, Color::BLACK);
    }
    draw_glyph_run(surface, text, origin_x, origin_y, Color::ORANGE);
}

fn draw_glyph_run(surface: &mut Surface, text: &str, x: i64, y: i64, color: Color) {
    for (i, ch) in text.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(ch) else {
            continue;
        };
        let cell_x = x + i as i64 * GLYPH_SIZE;
        for (row, bits) in glyph.iter().enumerate() {
            let bits = *bits;
            for bit in 0..8u8 {
                if bits & (1u8 << bit) == 0 {
                    continue;
                }
                let px = cell_x + bit as i64 * GLYPH_SCALE;
                let py = y + row as i64 * GLYPH_SCALE;
                for sy in 0..GLYPH_SCALE {
                    for sx in 0..GLYPH_SCALE {
                        surface.put(px + sx, py + sy, color);
                    }
                }
            }
        }
    }
}
