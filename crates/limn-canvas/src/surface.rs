//! RGBA surface and pixel-level drawing operations.

use std::io::{self, Write};

use crate::fit::Placement;

/// Packed RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const GREEN: Color = Color([0, 128, 0, 255]);
    pub const ORANGE: Color = Color([255, 165, 0, 255]);
    pub const WHITE: Color = Color([255, 255, 255, 255]);
}

/// One decoded video frame: tightly packed RGBA8, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl VideoFrame {
    /// A single-color frame, mostly useful in tests and pattern sources.
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&color.0);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Pixel at (x, y), if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.data[i..i + 4].try_into().ok()
    }
}

/// An owned RGBA8 canvas. Starts out black.
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        let mut s = Self {
            width,
            height,
            data: vec![0; (width * height * 4) as usize],
        };
        s.clear(Color::BLACK);
        s
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: Color) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&color.0);
        }
    }

    /// Write one pixel; out-of-bounds coordinates are dropped.
    pub fn put(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = ((y as u32 * self.width + x as u32) * 4) as usize;
        self.data[i..i + 4].copy_from_slice(&color.0);
    }

    /// Pixel at (x, y), if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.data[i..i + 4].try_into().ok()
    }

    /// Blit `frame` into the placement rectangle, nearest-neighbor scaled.
    pub fn draw_frame(&mut self, frame: &VideoFrame, placement: &Placement) {
        if placement.width <= 0.0 || placement.height <= 0.0 {
            return;
        }
        let dst_w = placement.width.round() as i64;
        let dst_h = placement.height.round() as i64;
        let left = placement.left.round() as i64;
        let top = placement.top.round() as i64;
        for dy in 0..dst_h {
            let sy = ((dy as f64 / dst_h as f64) * frame.height as f64) as u32;
            let sy = sy.min(frame.height.saturating_sub(1));
            for dx in 0..dst_w {
                let sx = ((dx as f64 / dst_w as f64) * frame.width as f64) as u32;
                let sx = sx.min(frame.width.saturating_sub(1));
                if let Some(px) = frame.pixel(sx, sy) {
                    self.put(left + dx, top + dy, Color(px));
                }
            }
        }
    }

    /// Stroke the border of a rectangle. The stroke grows inward from the
    /// path by `line_width` pixels.
    pub fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color, line_width: u32) {
        let x0 = x.round() as i64;
        let y0 = y.round() as i64;
        let x1 = x0 + (w.round() as i64) - 1;
        let y1 = y0 + (h.round() as i64) - 1;
        if x1 < x0 || y1 < y0 {
            return;
        }
        let lw = line_width.max(1) as i64;
        for t in 0..lw {
            for xx in x0..=x1 {
                self.put(xx, y0 + t, color);
                self.put(xx, y1 - t, color);
            }
            for yy in y0..=y1 {
                self.put(x0 + t, yy, color);
                self.put(x1 - t, yy, color);
            }
        }
    }

    /// Serialize as a binary PPM (P6) image, alpha dropped.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        for px in self.data.chunks_exact(4) {
            out.write_all(&px[..3])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_surface_starts_black() {
        let s = Surface::new(4, 4);
        assert_eq!(s.pixel(0, 0), Some(Color::BLACK.0));
        assert_eq!(s.pixel(3, 3), Some(Color::BLACK.0));
    }

    #[test]
    fn put_ignores_out_of_bounds() {
        let mut s = Surface::new(4, 4);
        s.put(-1, 0, Color::WHITE);
        s.put(0, 4, Color::WHITE);
        s.put(100, 100, Color::WHITE);
        assert!(s
            .data
            .chunks_exact(4)
            .all(|px| px == Color::BLACK.0));
    }

    #[test]
    fn draw_frame_scales_down_and_centers() {
        // 2x2 white frame drawn at half scale into an 8x4 canvas lands as a
        // 4x4 block centered horizontally.
        let frame = VideoFrame::solid(8, 8, Color::WHITE);
        let mut s = Surface::new(8, 4);
        let p = Placement::fit(8, 4, 8, 8);
        assert_eq!(p.left, 2.0);
        s.draw_frame(&frame, &p);
        assert_eq!(s.pixel(1, 0), Some(Color::BLACK.0));
        assert_eq!(s.pixel(2, 0), Some(Color::WHITE.0));
        assert_eq!(s.pixel(5, 3), Some(Color::WHITE.0));
        assert_eq!(s.pixel(6, 0), Some(Color::BLACK.0));
    }

    #[test]
    fn stroke_rect_draws_border_only() {
        let mut s = Surface::new(16, 16);
        s.stroke_rect(2.0, 2.0, 8.0, 8.0, Color::GREEN, 2);
        // On the path
        assert_eq!(s.pixel(2, 2), Some(Color::GREEN.0));
        assert_eq!(s.pixel(9, 9), Some(Color::GREEN.0));
        // Second ring of the stroke
        assert_eq!(s.pixel(3, 3), Some(Color::GREEN.0));
        // Interior untouched
        assert_eq!(s.pixel(5, 5), Some(Color::BLACK.0));
        // Outside untouched
        assert_eq!(s.pixel(1, 1), Some(Color::BLACK.0));
    }

    #[test]
    fn stroke_rect_clips_at_edges() {
        let mut s = Surface::new(8, 8);
        s.stroke_rect(-4.0, -4.0, 8.0, 8.0, Color::GREEN, 1);
        assert_eq!(s.pixel(3, 0), Some(Color::GREEN.0));
        assert_eq!(s.pixel(7, 7), Some(Color::BLACK.0));
    }

    #[test]
    fn ppm_header_and_size() {
        let s = Surface::new(3, 2);
        let mut buf = Vec::new();
        s.write_ppm(&mut buf).unwrap();
        assert!(buf.starts_with(b"P6\n3 2\n255\n"));
        assert_eq!(buf.len(), b"P6\n3 2\n255\n".len() + 3 * 2 * 3);
    }
}
