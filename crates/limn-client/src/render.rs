//! The per-frame overlay compositor.
//!
//! A cancellable periodic task: every tick it composites the latest video
//! frame and annotation into the surface. Nothing is drawn until the first
//! annotation arrives; after that the most recent values win, with no
//! attempt to align annotation and frame timing.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::time;
use tracing::{info, warn};

use limn_canvas::{draw_text, Color, Placement, Surface, VideoFrame};
use limn_core::Annotation;

use crate::session::SessionHandle;

/// Where annotation text lands on the canvas (baseline).
const TEXT_X: f64 = 15.0;
const TEXT_Y: f64 = 30.0;

/// Rectangle stroke width in pixels.
const RECT_LINE_WIDTH: u32 = 2;

/// Periodically writes composited surfaces out as PPM files.
pub struct FrameDump {
    dir: PathBuf,
    every: u64,
    tick: u64,
    written: u64,
}

impl FrameDump {
    pub fn new(dir: PathBuf, every: u64) -> io::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            every: every.max(1),
            tick: 0,
            written: 0,
        })
    }

    fn maybe_write(&mut self, surface: &Surface) -> io::Result<()> {
        let due = self.tick % self.every == 0;
        self.tick += 1;
        if !due {
            return Ok(());
        }
        let path = self.dir.join(format!("frame_{:06}.ppm", self.written));
        let mut file = File::create(path)?;
        surface.write_ppm(&mut file)?;
        self.written += 1;
        Ok(())
    }
}

/// Owns the surface and the receiving ends of the session's slots.
pub struct RenderLoop {
    surface: Surface,
    annotations: watch::Receiver<Option<Annotation>>,
    frames: watch::Receiver<Option<VideoFrame>>,
}

impl RenderLoop {
    pub fn new(handle: &SessionHandle, width: u32, height: u32) -> Self {
        Self {
            surface: Surface::new(width, height),
            annotations: handle.annotations(),
            frames: handle.frames(),
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Composite one tick. Returns false (and touches nothing) while no
    /// annotation has arrived yet.
    pub fn render_tick(&mut self, placement: &Placement) -> bool {
        let annotation = self.annotations.borrow().clone();
        let Some(annotation) = annotation else {
            return false;
        };
        let frame = self.frames.borrow().clone();
        if let Some(frame) = frame {
            self.surface.draw_frame(&frame, placement);
        }
        self.surface.stroke_rect(
            annotation.x,
            annotation.y,
            annotation.width,
            annotation.height,
            Color::GREEN,
            RECT_LINE_WIDTH,
        );
        draw_text(&mut self.surface, &annotation.text, TEXT_X, TEXT_Y);
        true
    }

    /// Run until the shutdown signal fires. Waits for the first decodable
    /// frame, fixes the placement from its dimensions (later resolution
    /// changes keep the original placement), then ticks at `fps`.
    pub async fn run(
        mut self,
        fps: u32,
        mut shutdown: oneshot::Receiver<()>,
        mut dump: Option<FrameDump>,
    ) {
        let placement = tokio::select! {
            _ = &mut shutdown => {
                info!("render loop shutdown requested");
                return;
            }
            placement = self.wait_for_video() => match placement {
                Some(p) => p,
                None => return,
            },
        };

        let mut ticker = time::interval(Duration::from_secs_f64(1.0 / fps.max(1) as f64));
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("render loop shutdown requested");
                    return;
                }
                _ = ticker.tick() => {
                    if self.render_tick(&placement) {
                        if let Some(dump) = dump.as_mut() {
                            if let Err(e) = dump.maybe_write(&self.surface) {
                                warn!("frame dump failed: {e}");
                            }
                        }
                    }
                }
            }
        }
    }

    /// Block until a first frame exists, then compute its placement on
    /// this surface. None when the frame slot is gone.
    async fn wait_for_video(&mut self) -> Option<Placement> {
        loop {
            {
                let current = self.frames.borrow_and_update();
                if let Some(frame) = current.as_ref() {
                    return Some(Placement::fit(
                        self.surface.width(),
                        self.surface.height(),
                        frame.width,
                        frame.height,
                    ));
                }
            }
            if self.frames.changed().await.is_err() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::EventLog;

    fn annotation(x: f64, y: f64, w: f64, h: f64, text: &str) -> Annotation {
        Annotation {
            x,
            y,
            width: w,
            height: h,
            text: text.into(),
        }
    }

    fn all_black(surface: &Surface) -> bool {
        (0..surface.height())
            .all(|y| (0..surface.width()).all(|x| surface.pixel(x, y) == Some(Color::BLACK.0)))
    }

    #[test]
    fn nothing_is_drawn_before_the_first_annotation() {
        let handle = SessionHandle::new(EventLog::new());
        handle.publish_frame(VideoFrame::solid(1280, 720, Color::WHITE));
        let placement = Placement::fit(640, 480, 1280, 720);
        let mut render = RenderLoop::new(&handle, 640, 480);
        for _ in 0..3 {
            assert!(!render.render_tick(&placement));
        }
        assert!(all_black(render.surface()));
    }

    #[test]
    fn annotation_triggers_frame_rect_and_text() {
        let handle = SessionHandle::new(EventLog::new());
        handle.publish_frame(VideoFrame::solid(1280, 720, Color::WHITE));
        handle.set_annotation(annotation(100.0, 100.0, 50.0, 40.0, "cat"));
        let placement = Placement::fit(640, 480, 1280, 720);
        let mut render = RenderLoop::new(&handle, 640, 480);
        assert!(render.render_tick(&placement));

        let s = render.surface();
        // Video fills 640x360 centered vertically at top=60.
        assert_eq!(s.pixel(0, 59), Some(Color::BLACK.0));
        assert_eq!(s.pixel(0, 60), Some(Color::WHITE.0));
        assert_eq!(s.pixel(639, 419), Some(Color::WHITE.0));
        assert_eq!(s.pixel(0, 420), Some(Color::BLACK.0));
        // Rectangle stroke on its path.
        assert_eq!(s.pixel(100, 100), Some(Color::GREEN.0));
        assert_eq!(s.pixel(149, 139), Some(Color::GREEN.0));
        // Text fill near the fixed position.
        let orange_near_text = (0..40u32)
            .any(|y| (0..200u32).any(|x| s.pixel(x, y) == Some(Color::ORANGE.0)));
        assert!(orange_near_text);
    }

    #[test]
    fn next_tick_reflects_only_the_latest_annotation() {
        let handle = SessionHandle::new(EventLog::new());
        handle.publish_frame(VideoFrame::solid(1280, 720, Color::WHITE));
        handle.set_annotation(annotation(10.0, 200.0, 30.0, 40.0, "A"));
        handle.set_annotation(annotation(300.0, 200.0, 8.0, 8.0, "B"));
        let placement = Placement::fit(640, 480, 1280, 720);
        let mut render = RenderLoop::new(&handle, 640, 480);
        assert!(render.render_tick(&placement));

        let s = render.surface();
        assert_eq!(s.pixel(300, 200), Some(Color::GREEN.0));
        // The first rectangle's corner sits on the white video region,
        // untouched by any stroke.
        assert_eq!(s.pixel(10, 200), Some(Color::WHITE.0));
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_before_any_video() {
        let handle = SessionHandle::new(EventLog::new());
        let render = RenderLoop::new(&handle, 64, 48);
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(render.run(60, rx, None));
        tx.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_while_ticking() {
        let handle = SessionHandle::new(EventLog::new());
        handle.publish_frame(VideoFrame::solid(64, 48, Color::WHITE));
        handle.set_annotation(annotation(1.0, 1.0, 4.0, 4.0, "x"));
        let render = RenderLoop::new(&handle, 64, 48);
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(render.run(240, rx, None));
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(()).unwrap();
        task.await.unwrap();
    }
}
