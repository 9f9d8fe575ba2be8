//! Gather-then-send signaling exchange over HTTP.
//!
//! Candidates are not trickled: the exchange waits for end-of-candidates,
//! then POSTs the complete local description to the relay in one shot and
//! applies the returned description. Simpler protocol, slower negotiation.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;

use limn_core::{
    Error, Result, SessionDescription, SignalRequest, SignalResponse, SIGNAL_ACCEPT_CONTENT_TYPE,
    SIGNAL_CONTENT_TYPE, SIGNAL_PATH,
};

use crate::session::SessionContext;

/// Create an offer and install it as the local description.
pub async fn create_offer(pc: &RTCPeerConnection) -> anyhow::Result<()> {
    let offer = pc.create_offer(None).await?;
    pc.set_local_description(offer).await?;
    Ok(())
}

/// Spawn the exchange as a detached task. A failure is appended to the
/// session log and nothing more: no retry, no propagation. The peer
/// connection is left mid-negotiation.
pub fn spawn_exchange(ctx: Arc<SessionContext>, base_url: String, name: String) {
    tokio::spawn(async move {
        if let Err(e) = run_exchange(&ctx, &base_url, &name).await {
            ctx.handle.log.append(format!("signaling error: {e}"));
        }
    });
}

/// Wait for ICE gathering to complete, POST the local description under
/// `name`, and apply the relay's description as the remote one.
pub async fn run_exchange(ctx: &SessionContext, base_url: &str, name: &str) -> Result<()> {
    let mut gather = ctx.pc.gathering_complete_promise().await;
    let _ = gather.recv().await;

    let local = ctx
        .pc
        .local_description()
        .await
        .ok_or_else(|| Error::internal("no local description after gathering"))?;
    let sd = SessionDescription {
        sdp_type: local.sdp_type.to_string(),
        sdp: local.sdp.clone(),
    };
    ctx.handle.record_local_description(
        serde_json::to_string(&sd).map_err(Error::serialization)?,
    );

    let request = SignalRequest {
        name: name.to_string(),
        sd,
    };
    let url = format!("{}{SIGNAL_PATH}", base_url.trim_end_matches('/'));
    // No request timeout: a hung relay leaves negotiation incomplete with
    // nothing but the missing remote description to show for it.
    let client = reqwest::Client::new();
    let response = post_sdp(&client, &url, &request).await?;

    ctx.handle.record_remote_description(
        serde_json::to_string(&response.sd).map_err(Error::serialization)?,
    );

    let remote = to_rtc_description(&response.sd)?;
    ctx.pc
        .set_remote_description(remote)
        .await
        .map_err(Error::signaling)?;
    ctx.handle.log.append("remote description applied");
    Ok(())
}

/// POST one signaling request and validate the relay's reply: 2xx status
/// and the exact JSON content type, or an error.
pub async fn post_sdp(
    client: &reqwest::Client,
    url: &str,
    request: &SignalRequest,
) -> Result<SignalResponse> {
    let body = serde_json::to_string(request).map_err(Error::serialization)?;
    let response = client
        .post(url)
        .header(CONTENT_TYPE, SIGNAL_CONTENT_TYPE)
        .body(body)
        .send()
        .await
        .map_err(Error::signaling)?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::signaling(format!("{} for {url}", status.as_u16())));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if content_type != SIGNAL_ACCEPT_CONTENT_TYPE {
        return Err(Error::signaling(format!(
            "content type expected `{SIGNAL_ACCEPT_CONTENT_TYPE}` but got `{content_type}`"
        )));
    }

    let body = response.text().await.map_err(Error::signaling)?;
    serde_json::from_str(&body).map_err(Error::serialization)
}

fn to_rtc_description(sd: &SessionDescription) -> Result<RTCSessionDescription> {
    let desc = match sd.sdp_type.as_str() {
        "offer" => RTCSessionDescription::offer(sd.sdp.clone()),
        "answer" => RTCSessionDescription::answer(sd.sdp.clone()),
        "pranswer" => RTCSessionDescription::pranswer(sd.sdp.clone()),
        other => return Err(Error::signaling(format!("unexpected sdp type `{other}`"))),
    };
    desc.map_err(Error::signaling)
}
