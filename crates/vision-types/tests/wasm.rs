//! WASM-target tests for vision-types.
//!
//! Mirrors the native unit tests but runs under wasm32-unknown-unknown
//! via `wasm-pack test --node`.

use wasm_bindgen_test::*;

use serde_json::Value;
use vision_types::caption::*;
use vision_types::clock;
use vision_types::config::*;
use vision_types::error::*;
use vision_types::event::*;
use vision_types::message::*;
use vision_types::session::*;

// ─── Clock Tests ─────────────────────────────────────────

#[wasm_bindgen_test]
fn time_label_has_meridiem() {
    let label = clock::time_label();
    assert!(label.ends_with("AM") || label.ends_with("PM"), "got {}", label);
}

#[wasm_bindgen_test]
fn event_ids_are_unique() {
    assert_ne!(clock::new_event_id(), clock::new_event_id());
}

#[wasm_bindgen_test]
fn caption_entry_is_stamped() {
    let entry = CaptionLogEntry::new("A cat", 10, "image/jpeg");
    assert!(!entry.timestamp.is_empty());
}

// ─── Message Tests ───────────────────────────────────────

#[wasm_bindgen_test]
fn outbound_wire_omits_timestamp() {
    let mut msg = OutboundMessage::system_text("ctx").with_event_id("evt_1");
    msg.timestamp = Some("1:00:00 PM".to_string());
    let wire: Value = serde_json::from_str(&msg.to_wire().unwrap()).unwrap();
    assert_eq!(wire["event_id"], "evt_1");
    assert!(wire.get("timestamp").is_none());
}

#[wasm_bindgen_test]
fn inbound_function_call() {
    let msg = InboundMessage::parse(
        r#"{"type":"response.function_call_arguments.done","name":"getLogs","call_id":"c1","arguments":"{}"}"#,
    )
    .unwrap();
    match msg.event {
        ServerEvent::FunctionCallArgumentsDone(call) => {
            assert_eq!(call.name, "getLogs");
            assert_eq!(call.call_id, "c1");
        }
        other => panic!("Unexpected event: {:?}", other),
    }
}

#[wasm_bindgen_test]
fn inbound_log_update_caption() {
    let msg = InboundMessage::parse(r#"{"type":"log.update","caption":"A dog"}"#).unwrap();
    assert_eq!(msg.caption(), Some("A dog"));
    assert_eq!(LogEntry::Received(msg).caption(), Some("A dog"));
}

#[wasm_bindgen_test]
fn inbound_without_type_is_rejected() {
    assert!(InboundMessage::parse(r#"{"item":{}}"#).is_err());
}

// ─── Config & Session Tests ──────────────────────────────

#[wasm_bindgen_test]
fn restart_backoff_is_capped() {
    let policy = RestartPolicy::default();
    assert_eq!(policy.delay_for(1), 500);
    assert_eq!(policy.delay_for(5), 8_000);
    assert_eq!(policy.delay_for(40), 8_000);
}

#[wasm_bindgen_test]
fn degraded_states() {
    assert!(ConnectionState::Failed.is_degraded());
    assert!(ConnectionState::Disconnected.is_degraded());
    assert!(!ConnectionState::Closed.is_degraded());
}

#[wasm_bindgen_test]
fn start_stage_wrapping() {
    let err = VisionError::Network("HTTP 401".to_string()).at_stage(StartStage::Token);
    assert!(matches!(err, VisionError::SessionStart { stage: StartStage::Token, .. }));
    assert_eq!(err.to_string(), "Session start failed at token: Network error: HTTP 401");
}
