//! Session context: one peer connection, its event log, and the
//! latest-value slots shared between handlers and the render loop.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::sync::watch;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::RTCPeerConnection;

use limn_canvas::VideoFrame;
use limn_core::Annotation;

/// Fixed STUN server. No fallback and no TURN.
pub const STUN_SERVER: &str = "stun:stun.l.google.com:19302";

/// Append-only line log mirrored to tracing. Stands in for an on-page log
/// element: handlers push human-readable lines, tests read them back.
#[derive(Clone, Default)]
pub struct EventLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::info!(target: "limn::log", "{msg}");
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(msg);
        }
    }

    /// Snapshot of all lines appended so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

#[derive(Default)]
struct NegotiatedDescriptions {
    local_json: Option<String>,
    remote_json: Option<String>,
}

/// Cloneable handle over the session's shared state. Event handlers
/// capture clones of this instead of reaching for globals.
#[derive(Clone)]
pub struct SessionHandle {
    pub log: EventLog,
    annotation_tx: Arc<watch::Sender<Option<Annotation>>>,
    frame_tx: Arc<watch::Sender<Option<VideoFrame>>>,
    descriptions: Arc<Mutex<NegotiatedDescriptions>>,
}

impl SessionHandle {
    pub fn new(log: EventLog) -> Self {
        let (annotation_tx, _) = watch::channel(None);
        let (frame_tx, _) = watch::channel(None);
        Self {
            log,
            annotation_tx: Arc::new(annotation_tx),
            frame_tx: Arc::new(frame_tx),
            descriptions: Arc::new(Mutex::new(NegotiatedDescriptions::default())),
        }
    }

    /// Overwrite the annotation slot. The first call marks the overlay
    /// ready; later calls win over earlier ones unconditionally.
    pub fn set_annotation(&self, annotation: Annotation) {
        self.annotation_tx.send_replace(Some(annotation));
    }

    pub fn annotations(&self) -> watch::Receiver<Option<Annotation>> {
        self.annotation_tx.subscribe()
    }

    /// Overwrite the latest decoded frame.
    pub fn publish_frame(&self, frame: VideoFrame) {
        self.frame_tx.send_replace(Some(frame));
    }

    pub fn frames(&self) -> watch::Receiver<Option<VideoFrame>> {
        self.frame_tx.subscribe()
    }

    pub fn record_local_description(&self, json: String) {
        if let Ok(mut d) = self.descriptions.lock() {
            d.local_json = Some(json);
        }
    }

    pub fn record_remote_description(&self, json: String) {
        if let Ok(mut d) = self.descriptions.lock() {
            d.remote_json = Some(json);
        }
    }

    /// The final local description JSON as sent to the relay, if any.
    pub fn local_description_json(&self) -> Option<String> {
        self.descriptions.lock().ok().and_then(|d| d.local_json.clone())
    }

    /// The remote description JSON as returned by the relay, if any.
    pub fn remote_description_json(&self) -> Option<String> {
        self.descriptions.lock().ok().and_then(|d| d.remote_json.clone())
    }
}

/// One negotiated media/data session. Built once per process; never
/// re-created after construction, so a failed connection is terminal.
pub struct SessionContext {
    pub pc: Arc<RTCPeerConnection>,
    pub handle: SessionHandle,
}

impl SessionContext {
    /// Connect with the fixed STUN configuration.
    pub async fn connect(log: EventLog) -> Result<Arc<Self>> {
        let config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: vec![STUN_SERVER.to_string()],
                ..Default::default()
            }],
            ..Default::default()
        };
        Self::connect_with_config(config, log).await
    }

    /// Connect with an explicit configuration. Tests use this to skip the
    /// STUN round trip.
    pub async fn connect_with_config(
        config: RTCConfiguration,
        log: EventLog,
    ) -> Result<Arc<Self>> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let mut registry = Registry::new();
        registry = register_default_interceptors(registry, &mut media_engine)?;
        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let pc = Arc::new(api.new_peer_connection(config).await?);
        let handle = SessionHandle::new(log);

        // State transitions are logged and nothing else: there is no
        // reconnect or retry path.
        let state_log = handle.log.clone();
        pc.on_ice_connection_state_change(Box::new(move |state| {
            let log = state_log.clone();
            Box::pin(async move {
                log.append(format!("ICEConnectionStateChange: {state}"));
            })
        }));

        let state_log = handle.log.clone();
        pc.on_peer_connection_state_change(Box::new(move |state| {
            let log = state_log.clone();
            Box::pin(async move {
                log.append(format!("PeerConnectionStateChange: {state}"));
            })
        }));

        let candidate_log = handle.log.clone();
        pc.on_ice_candidate(Box::new(move |candidate| {
            let log = candidate_log.clone();
            Box::pin(async move {
                match candidate {
                    Some(c) => {
                        let line = c.to_json().map(|j| j.candidate).unwrap_or_default();
                        log.append(format!("ICECandidate: {line}"));
                    }
                    None => log.append("ICECandidate: gathering complete"),
                }
            })
        }));

        Ok(Arc::new(Self { pc, handle }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_log_appends_and_snapshots() {
        let log = EventLog::new();
        log.append("first");
        log.append(format!("second {}", 2));
        assert_eq!(log.lines(), vec!["first".to_string(), "second 2".to_string()]);
        assert!(log.contains("second"));
        assert!(!log.contains("third"));
    }

    #[test]
    fn annotation_slot_is_latest_wins() {
        let handle = SessionHandle::new(EventLog::new());
        let rx = handle.annotations();
        assert!(rx.borrow().is_none());

        handle.set_annotation(Annotation {
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 40.0,
            text: "A".into(),
        });
        handle.set_annotation(Annotation {
            x: 1.0,
            y: 1.0,
            width: 1.0,
            height: 1.0,
            text: "B".into(),
        });
        let latest = rx.borrow().clone().unwrap();
        assert_eq!(latest.text, "B");
        assert_eq!(latest.x, 1.0);
    }

    #[test]
    fn descriptions_are_recorded() {
        let handle = SessionHandle::new(EventLog::new());
        assert!(handle.local_description_json().is_none());
        handle.record_local_description("{\"type\":\"offer\"}".into());
        handle.record_remote_description("{\"type\":\"answer\"}".into());
        assert_eq!(handle.local_description_json().unwrap(), "{\"type\":\"offer\"}");
        assert_eq!(handle.remote_description_json().unwrap(), "{\"type\":\"answer\"}");
    }
}
