//! Publisher flow: local video onto the peer connection, then an offer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time;
use webrtc::api::media_engine::MIME_TYPE_H264;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;

use crate::capture::{self, CaptureConfig, CaptureSource};
use crate::session::SessionContext;
use crate::signaling;

pub struct PublishConfig {
    pub signal_url: String,
    /// Name sent to the relay with the offer.
    pub name: String,
    pub device: Option<PathBuf>,
    pub test_pattern: bool,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Acquire local media, attach it, and kick off negotiation.
///
/// A failed acquisition ends the flow here: classified, logged where
/// appropriate, and nothing else happens. Permission denial is treated as
/// the user cancelling and produces no output at all.
pub async fn start(ctx: Arc<SessionContext>, config: PublishConfig) -> Result<()> {
    let source = match capture::acquire(&CaptureConfig {
        device: config.device.clone(),
        test_pattern: config.test_pattern,
        width: config.width,
        height: config.height,
    }) {
        Ok(source) => source,
        Err(err) => {
            capture::log_acquire_error(&ctx.handle.log, &err);
            return Ok(());
        }
    };

    let track = Arc::new(TrackLocalStaticSample::new(
        RTCRtpCodecCapability {
            mime_type: MIME_TYPE_H264.to_owned(),
            ..Default::default()
        },
        "video".to_owned(),
        "limn".to_owned(),
    ));
    ctx.pc
        .add_track(Arc::clone(&track) as Arc<dyn TrackLocal + Send + Sync>)
        .await?;

    spawn_sample_loop(ctx.clone(), track, source, config.fps);

    signaling::create_offer(&ctx.pc).await?;
    signaling::spawn_exchange(ctx.clone(), config.signal_url, config.name);
    Ok(())
}

/// Push samples onto the track at the configured rate. Preview frames go
/// into the session's frame slot so the local render path shows them.
fn spawn_sample_loop(
    ctx: Arc<SessionContext>,
    track: Arc<TrackLocalStaticSample>,
    mut source: Box<dyn CaptureSource>,
    fps: u32,
) {
    let frame_interval = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
    tokio::spawn(async move {
        let mut ticker = time::interval(frame_interval);
        loop {
            ticker.tick().await;
            let sample = match source.next_sample() {
                Ok(sample) => sample,
                Err(e) => {
                    ctx.handle.log.append(format!("capture stopped: {e}"));
                    break;
                }
            };
            if let Some(preview) = sample.preview {
                ctx.handle.publish_frame(preview);
            }
            if let Err(e) = track
                .write_sample(&Sample {
                    data: sample.payload,
                    duration: frame_interval,
                    ..Default::default()
                })
                .await
            {
                tracing::debug!("sample write failed: {e}");
            }
        }
    });
}
