//! Signaling exchange against a mock relay.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use webrtc::peer_connection::configuration::RTCConfiguration;

use limn_client::session::{EventLog, SessionContext};
use limn_client::signaling;
use limn_core::{SessionDescription, SignalRequest};

const JSON_UTF8: &str = "application/json; charset=utf-8";

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

fn request_fixture() -> SignalRequest {
    SignalRequest {
        name: "Client:1:2".into(),
        sd: SessionDescription {
            sdp_type: "offer".into(),
            sdp: "v=0\r\n".into(),
        },
    }
}

#[tokio::test]
async fn accepts_a_well_formed_answer() {
    async fn ok_handler() -> impl IntoResponse {
        (
            [(header::CONTENT_TYPE, JSON_UTF8)],
            r#"{"SD":{"type":"answer","sdp":"v=0\r\n"}}"#,
        )
    }
    let base = serve(Router::new().route("/sdp", post(ok_handler))).await;

    let client = reqwest::Client::new();
    let response = signaling::post_sdp(&client, &format!("{base}/sdp"), &request_fixture())
        .await
        .expect("exchange should succeed");
    assert_eq!(response.sd.sdp_type, "answer");
    assert_eq!(response.sd.sdp, "v=0\r\n");
}

#[tokio::test]
async fn rejects_a_non_2xx_status() {
    async fn error_handler() -> impl IntoResponse {
        StatusCode::INTERNAL_SERVER_ERROR
    }
    let base = serve(Router::new().route("/sdp", post(error_handler))).await;

    let client = reqwest::Client::new();
    let err = signaling::post_sdp(&client, &format!("{base}/sdp"), &request_fixture())
        .await
        .expect_err("500 must be an error");
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn rejects_the_wrong_content_type_even_on_2xx() {
    async fn wrong_type_handler() -> impl IntoResponse {
        (
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"SD":{"type":"answer","sdp":"v=0\r\n"}}"#,
        )
    }
    let base = serve(Router::new().route("/sdp", post(wrong_type_handler))).await;

    let client = reqwest::Client::new();
    let err = signaling::post_sdp(&client, &format!("{base}/sdp"), &request_fixture())
        .await
        .expect_err("wrong content type must be an error");
    assert!(err.to_string().contains("content type"));
}

#[tokio::test]
async fn posted_body_matches_the_local_description_at_send_time() {
    type Captured = Arc<Mutex<Option<String>>>;

    async fn capture_handler(State(captured): State<Captured>, body: String) -> impl IntoResponse {
        *captured.lock().unwrap() = Some(body);
        StatusCode::INTERNAL_SERVER_ERROR
    }

    let captured: Captured = Arc::new(Mutex::new(None));
    let app = Router::new()
        .route("/sdp", post(capture_handler))
        .with_state(captured.clone());
    let base = serve(app).await;

    // No ICE servers: gathering finishes on host candidates alone.
    let ctx = SessionContext::connect_with_config(RTCConfiguration::default(), EventLog::new())
        .await
        .expect("peer connection");
    ctx.pc
        .create_data_channel("probe", None)
        .await
        .expect("data channel");
    signaling::create_offer(&ctx.pc).await.expect("offer");

    let err = signaling::run_exchange(&ctx, &base, "Client:1:2")
        .await
        .expect_err("relay rejects, exchange must fail");
    assert!(err.to_string().contains("500"));

    let body = captured.lock().unwrap().clone().expect("body captured");
    let request: SignalRequest = serde_json::from_str(&body).expect("valid request body");
    assert_eq!(request.name, "Client:1:2");

    let local = ctx.pc.local_description().await.expect("local description");
    assert_eq!(request.sd.sdp_type, local.sdp_type.to_string());
    assert_eq!(request.sd.sdp, local.sdp);

    // Negotiation is left incomplete: no remote description was applied.
    assert!(ctx.pc.remote_description().await.is_none());
    assert!(ctx.handle.remote_description_json().is_none());
}

#[tokio::test]
async fn spawned_exchange_swallows_failures_into_the_log() {
    async fn error_handler() -> impl IntoResponse {
        StatusCode::INTERNAL_SERVER_ERROR
    }
    let base = serve(Router::new().route("/sdp", post(error_handler))).await;

    let log = EventLog::new();
    let ctx = SessionContext::connect_with_config(RTCConfiguration::default(), log.clone())
        .await
        .expect("peer connection");
    ctx.pc
        .create_data_channel("probe", None)
        .await
        .expect("data channel");
    signaling::create_offer(&ctx.pc).await.expect("offer");

    signaling::spawn_exchange(ctx.clone(), base, "Client:3:4".into());

    let mut logged = false;
    for _ in 0..100 {
        if log.contains("signaling error") {
            logged = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(logged, "failure must surface in the log and nowhere else");
    assert!(ctx.pc.remote_description().await.is_none());
}
