//! Scale-to-fit math for placing a video frame on a canvas.

/// Where a video frame lands on a canvas: uniformly scaled to fit the
/// smaller dimension, centered on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f64,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    /// Compute the placement for a `video_w` x `video_h` frame on a
    /// `canvas_w` x `canvas_h` surface.
    pub fn fit(canvas_w: u32, canvas_h: u32, video_w: u32, video_h: u32) -> Self {
        if video_w == 0 || video_h == 0 {
            return Self {
                scale: 0.0,
                left: 0.0,
                top: 0.0,
                width: 0.0,
                height: 0.0,
            };
        }
        let scale = f64::min(
            canvas_w as f64 / video_w as f64,
            canvas_h as f64 / video_h as f64,
        );
        let width = video_w as f64 * scale;
        let height = video_h as f64 * scale;
        let left = canvas_w as f64 / 2.0 - width / 2.0;
        let top = canvas_h as f64 / 2.0 - height / 2.0;
        Self {
            scale,
            left,
            top,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_video_letterboxes_vertically() {
        let p = Placement::fit(640, 480, 1280, 720);
        assert_eq!(p.scale, 0.5);
        assert_eq!(p.width, 640.0);
        assert_eq!(p.height, 360.0);
        assert_eq!(p.left, 0.0);
        assert_eq!(p.top, 60.0);
    }

    #[test]
    fn tall_video_pillarboxes_horizontally() {
        let p = Placement::fit(640, 480, 480, 960);
        assert_eq!(p.scale, 0.5);
        assert_eq!(p.width, 240.0);
        assert_eq!(p.height, 480.0);
        assert_eq!(p.left, 200.0);
        assert_eq!(p.top, 0.0);
    }

    #[test]
    fn exact_fit_is_identity() {
        let p = Placement::fit(640, 480, 640, 480);
        assert_eq!(p.scale, 1.0);
        assert_eq!(p.left, 0.0);
        assert_eq!(p.top, 0.0);
    }

    #[test]
    fn zero_sized_video_yields_empty_placement() {
        let p = Placement::fit(640, 480, 0, 720);
        assert_eq!(p.scale, 0.0);
        assert_eq!(p.width, 0.0);
    }
}
