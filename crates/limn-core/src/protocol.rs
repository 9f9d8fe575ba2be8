//! Wire types exchanged with the signaling relay and over the data channel.

use serde::{Deserialize, Serialize};

/// Path on the relay that accepts the offer/answer exchange.
pub const SIGNAL_PATH: &str = "/sdp";

/// Content type the relay expects on the POSTed body.
pub const SIGNAL_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Content type the relay must answer with. Anything else is an error,
/// even on a 2xx status.
pub const SIGNAL_ACCEPT_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Upper bound (exclusive) for the random draw in a viewer identifier.
pub const CLIENT_ID_DRAW_BOUND: u32 = 1_000_000_000;

/// An SDP payload as serialized on the wire: `{"type": ..., "sdp": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: String,
    pub sdp: String,
}

/// Body POSTed to the relay's `/sdp` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRequest {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "SD")]
    pub sd: SessionDescription,
}

/// Body the relay answers with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalResponse {
    #[serde(rename = "SD")]
    pub sd: SessionDescription,
}

/// Overlay payload carried on the data channel.
///
/// One mutable slot holds the most recent payload; there is no history
/// and no alignment with video frame timing. Latest message wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
}

/// Decode a data-channel frame as one char per byte.
///
/// The deployed producer emits ASCII-range JSON and the consumer maps each
/// byte to the Unicode scalar of the same value. Multi-byte UTF-8 content
/// comes out mangled; kept as-is to match the other end of the wire.
pub fn decode_channel_text(data: &[u8]) -> String {
    data.iter().map(|&b| char::from(b)).collect()
}

/// Pseudo-unique viewer identifier: wall-clock millis plus one random draw.
///
/// Collides only for two joins in the same millisecond with the same draw.
pub fn client_id(timestamp_ms: u64, draw: u32) -> String {
    format!("Client:{timestamp_ms}:{draw}")
}
