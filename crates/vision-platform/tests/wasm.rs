//! WASM-target tests for vision-platform (Node.js runtime).
//!
//! Covers the adapter pieces that do not need a browser. The peer
//! connection, microphone and fetch-based adapters require a browser.

use wasm_bindgen_test::*;

use vision_core::ports::TimerPort;
use vision_platform::timer::GlooTimer;
use vision_platform::token::TokenResponse;
use vision_platform::webrtc::{bundle_policy, connection_state_from};
use vision_types::config::BundlePolicy;
use vision_types::session::ConnectionState;
use web_sys::{RtcBundlePolicy, RtcPeerConnectionState};

// ─── Token Tests ─────────────────────────────────────────

#[wasm_bindgen_test]
fn token_response_reads_client_secret() {
    let data: TokenResponse = serde_json::from_str(
        r#"{"id":"sess_1","client_secret":{"value":"ek_abc","expires_at":1700000000}}"#,
    )
    .unwrap();
    assert_eq!(data.client_secret.value, "ek_abc");
}

#[wasm_bindgen_test]
fn token_response_without_secret_is_rejected() {
    assert!(serde_json::from_str::<TokenResponse>(r#"{"error":"no key"}"#).is_err());
}

// ─── WebRTC Mapping Tests ────────────────────────────────

#[wasm_bindgen_test]
fn connection_states_map_one_to_one() {
    assert_eq!(connection_state_from(RtcPeerConnectionState::New), ConnectionState::New);
    assert_eq!(connection_state_from(RtcPeerConnectionState::Connected), ConnectionState::Connected);
    assert_eq!(
        connection_state_from(RtcPeerConnectionState::Disconnected),
        ConnectionState::Disconnected
    );
    assert_eq!(connection_state_from(RtcPeerConnectionState::Failed), ConnectionState::Failed);
    assert_eq!(connection_state_from(RtcPeerConnectionState::Closed), ConnectionState::Closed);
}

#[wasm_bindgen_test]
fn bundle_policy_maps() {
    assert_eq!(bundle_policy(BundlePolicy::MaxBundle), RtcBundlePolicy::MaxBundle);
    assert_eq!(bundle_policy(BundlePolicy::Balanced), RtcBundlePolicy::Balanced);
}

// ─── Timer Tests ─────────────────────────────────────────

#[wasm_bindgen_test]
async fn gloo_timer_resolves() {
    GlooTimer.sleep(5).await;
}
