//! Software canvas for Limn.
//!
//! A plain RGBA8 surface plus the handful of drawing operations the render
//! loop needs: a nearest-neighbor scaled frame blit, a stroked rectangle,
//! and 8x8 bitmap text. No GPU, no windowing; consumers decide what to do
//! with the composited pixels.

#![forbid(unsafe_code)]

pub mod fit;
pub mod surface;
pub mod text;

pub use fit::Placement;
pub use surface::{Color, Surface, VideoFrame};
pub use text::draw_text;
