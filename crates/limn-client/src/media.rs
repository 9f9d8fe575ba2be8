//! Frame production for the viewer path.

use limn_canvas::{Color, VideoFrame};

/// Turns incoming RTP payloads into frames for the render loop.
pub trait FrameDecoder: Send {
    /// Feed one payload; returns a frame when one is ready.
    fn push(&mut self, payload: &[u8]) -> Option<VideoFrame>;
}

/// Packets folded into each synthetic frame.
const PACKETS_PER_FRAME: u32 = 5;

/// Stand-in for a real H.264 decoder: paces synthetic frames off packet
/// arrival at the configured resolution.
pub struct TestPatternDecoder {
    width: u32,
    height: u32,
    pending: u32,
    seq: u64,
}

impl TestPatternDecoder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pending: 0,
            seq: 0,
        }
    }
}

impl FrameDecoder for TestPatternDecoder {
    fn push(&mut self, payload: &[u8]) -> Option<VideoFrame> {
        if payload.is_empty() {
            return None;
        }
        self.pending += 1;
        if self.pending < PACKETS_PER_FRAME {
            return None;
        }
        self.pending = 0;
        let frame = test_pattern(self.width, self.height, self.seq);
        self.seq += 1;
        Some(frame)
    }
}

/// Gray gradient with a moving white bar; deterministic in `seq`.
pub fn test_pattern(width: u32, height: u32, seq: u64) -> VideoFrame {
    let mut frame = VideoFrame::solid(width, height, Color::BLACK);
    if width == 0 || height == 0 {
        return frame;
    }
    let bar = (seq % width as u64) as u32;
    for y in 0..height {
        let shade = (y * 255 / height.max(1)) as u8;
        for x in 0..width {
            let i = ((y * width + x) * 4) as usize;
            let px = if x == bar {
                [255, 255, 255, 255]
            } else {
                [shade, shade, shade, 255]
            };
            frame.data[i..i + 4].copy_from_slice(&px);
        }
    }
    frame
}
