//! Viewer flow: receive-only video plus the annotation data channel.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use rand::Rng;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;

use limn_core::{client_id, decode_channel_text, Annotation, CLIENT_ID_DRAW_BOUND};

use crate::media::{FrameDecoder, TestPatternDecoder};
use crate::session::{SessionContext, SessionHandle};
use crate::signaling;

pub struct ViewConfig {
    pub signal_url: String,
    /// Natural size of the incoming video, used by the frame decoder.
    pub video_width: u32,
    pub video_height: u32,
}

/// Fresh pseudo-unique identifier for this viewer. Doubles as the data
/// channel label and the signaling name.
pub fn generate_client_id() -> String {
    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let draw = rand::thread_rng().gen_range(0..CLIENT_ID_DRAW_BOUND);
    client_id(timestamp_ms, draw)
}

/// Handle one incoming data-channel message: byte-per-char decode, JSON
/// parse, overwrite the annotation slot. A parse failure is logged and the
/// slot left untouched.
pub fn apply_channel_message(handle: &SessionHandle, data: &[u8]) {
    let text = decode_channel_text(data);
    match serde_json::from_str::<Annotation>(&text) {
        Ok(annotation) => handle.set_annotation(annotation),
        Err(e) => handle.log.append(format!("annotation parse error: {e}")),
    }
}

/// Wire up the viewer side of the session and kick off negotiation.
/// Returns the generated client id.
pub async fn start(ctx: Arc<SessionContext>, config: ViewConfig) -> Result<String> {
    let id = generate_client_id();

    ctx.pc
        .add_transceiver_from_kind(
            RTPCodecType::Video,
            Some(RTCRtpTransceiverInit {
                direction: RTCRtpTransceiverDirection::Recvonly,
                send_encodings: vec![],
            }),
        )
        .await?;

    let decoder: Arc<Mutex<Box<dyn FrameDecoder>>> = Arc::new(Mutex::new(Box::new(
        TestPatternDecoder::new(config.video_width, config.video_height),
    )));
    let track_handle = ctx.handle.clone();
    ctx.pc.on_track(Box::new(move |track, _receiver, _transceiver| {
        let handle = track_handle.clone();
        let decoder = decoder.clone();
        Box::pin(async move {
            handle.log.append(format!(
                "track received: kind={} codec={}",
                track.kind(),
                track.codec().capability.mime_type
            ));
            // Read in a separate task so this handler returns immediately
            // and later tracks can still fire.
            tokio::spawn(async move {
                loop {
                    match track.read_rtp().await {
                        Ok((packet, _attrs)) => {
                            let frame = decoder
                                .lock()
                                .ok()
                                .and_then(|mut d| d.push(&packet.payload));
                            if let Some(frame) = frame {
                                handle.publish_frame(frame);
                            }
                        }
                        Err(e) => {
                            tracing::debug!("track read ended: {e}");
                            break;
                        }
                    }
                }
            });
        })
    }));

    let dc = ctx.pc.create_data_channel(&id, None).await?;
    let open_log = ctx.handle.log.clone();
    dc.on_open(Box::new(move || {
        Box::pin(async move {
            open_log.append("data channel opened");
        })
    }));
    let close_log = ctx.handle.log.clone();
    dc.on_close(Box::new(move || {
        let log = close_log.clone();
        Box::pin(async move {
            log.append("data channel closed");
        })
    }));
    let message_handle = ctx.handle.clone();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let handle = message_handle.clone();
        Box::pin(async move {
            apply_channel_message(&handle, &msg.data);
        })
    }));

    signaling::create_offer(&ctx.pc).await?;
    signaling::spawn_exchange(ctx.clone(), config.signal_url, id.clone());
    Ok(id)
}
