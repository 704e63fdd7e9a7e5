//! Browser adapters for the vision-core ports.
//!
//! HTTP goes through gloo-net (`fetch`), the realtime transport through
//! `RTCPeerConnection`, and delays through gloo-timers.

pub mod token;
pub mod signaling;
pub mod webrtc;
pub mod captions;
pub mod settings;
pub mod timer;

pub use captions::HttpCaptionService;
pub use settings::SettingsClient;
pub use signaling::HttpSignaling;
pub use timer::GlooTimer;
pub use token::HttpTokenSource;
pub use webrtc::BrowserPeerConnector;

use vision_types::VisionError;
use wasm_bindgen::{JsCast, JsValue};

/// Best-effort readable message from a thrown JS value
pub(crate) fn js_error(value: JsValue) -> VisionError {
    let message = match value.dyn_ref::<js_sys::Error>() {
        Some(error) => String::from(error.message()),
        None => value.as_string().unwrap_or_else(|| format!("{:?}", value)),
    };
    VisionError::JsInterop(message)
}

pub(crate) fn network_error(error: gloo_net::Error) -> VisionError {
    VisionError::Network(error.to_string())
}
