//! JS-facing console. The page drives the session through this object.

use std::rc::Rc;

use gloo_utils::format::JsValueSerdeExt;
use js_sys::Promise;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use vision_core::captions::CaptionFeed;
use vision_core::controller::{SessionController, SessionPorts};
use vision_core::functions::FunctionTable;
use vision_core::notice_bus::NoticeBus;
use vision_platform::{
    BrowserPeerConnector, GlooTimer, HttpCaptionService, HttpSignaling, HttpTokenSource,
    SettingsClient,
};
use vision_types::{VisionError, config::VisionConfig, event::LogEntry};

fn to_js(error: VisionError) -> JsValue {
    js_sys::Error::new(&error.to_string()).into()
}

fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    JsValue::from_serde(value).map_err(|e| to_js(e.into()))
}

/// One realtime session at a time, plus the caption feed and server settings.
#[wasm_bindgen]
pub struct RealtimeConsole {
    controller: Rc<SessionController>,
    notices: NoticeBus,
    captions: Rc<CaptionFeed>,
    settings: Rc<SettingsClient>,
}

#[wasm_bindgen]
impl RealtimeConsole {
    /// `config` may be omitted or partial; missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<RealtimeConsole, JsValue> {
        let config: VisionConfig = if config.is_undefined() || config.is_null() {
            VisionConfig::default()
        } else {
            config
                .into_serde()
                .map_err(|e| to_js(VisionError::Config(e.to_string())))?
        };

        let ports = SessionPorts {
            token: Rc::new(HttpTokenSource::new(config.realtime.token_url.clone())),
            signaling: Rc::new(HttpSignaling::new(config.realtime.signaling_url())),
            connector: Rc::new(BrowserPeerConnector),
            timer: Rc::new(GlooTimer),
        };
        let captions_port = Rc::new(HttpCaptionService::new(config.captions.analyze_url.clone()));
        let settings = Rc::new(SettingsClient::new(config.captions.settings_base.clone()));

        let notices = NoticeBus::new();
        let controller = SessionController::new(config, ports, FunctionTable::new(), notices.clone());
        let captions = Rc::new(controller.caption_feed(captions_port));

        Ok(Self {
            controller: Rc::new(controller),
            notices,
            captions,
            settings,
        })
    }

    /// Resolves once the offer/answer exchange completes; the channel opens afterwards.
    pub fn start(&self) -> Promise {
        let controller = self.controller.clone();
        future_to_promise(async move {
            let session = controller.start().await.map_err(to_js)?;
            let runner = controller.clone();
            spawn_local(async move {
                if let Err(e) = runner.run(session).await {
                    log::error!("Session ended with error: {}", e);
                }
            });
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn stop(&self) {
        self.controller.stop();
    }

    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.controller.is_active()
    }

    pub fn status(&self) -> String {
        self.controller.status().label().to_string()
    }

    #[wasm_bindgen(js_name = sendText)]
    pub fn send_text_message(&self, text: &str) -> Result<(), JsValue> {
        self.controller.send_text_message(text).map_err(to_js)
    }

    /// Event log, most recent first
    pub fn events(&self) -> Result<JsValue, JsValue> {
        let events: Vec<Value> = self.controller.events().iter().map(LogEntry::to_json).collect();
        to_js_value(&events)
    }

    /// Diagnostics emitted since the last call
    #[wasm_bindgen(js_name = notices)]
    pub fn drain_notices(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.notices.drain())
    }

    /// Caption one captured frame and feed it into the session.
    /// Resolves to the caption log entry.
    #[wasm_bindgen(js_name = submitFrame)]
    pub fn submit_frame(&self, frame: Vec<u8>, mime_type: String) -> Promise {
        let captions = self.captions.clone();
        future_to_promise(async move {
            let (entry, _) = captions
                .submit_frame(&frame, &mime_type)
                .await
                .map_err(to_js)?;
            to_js_value(&entry)
        })
    }

    #[wasm_bindgen(js_name = captionIntervalMs)]
    pub fn caption_interval_ms(&self) -> u32 {
        self.controller.config().captions.interval_ms.min(u32::MAX as u64) as u32
    }

    #[wasm_bindgen(js_name = geminiSetting)]
    pub fn gemini_setting(&self) -> Promise {
        let settings = self.settings.clone();
        future_to_promise(async move { to_js_value(&settings.gemini_setting().await.map_err(to_js)?) })
    }

    #[wasm_bindgen(js_name = toggleGemini)]
    pub fn toggle_gemini(&self) -> Promise {
        let settings = self.settings.clone();
        future_to_promise(async move { to_js_value(&settings.toggle_gemini().await.map_err(to_js)?) })
    }

    #[wasm_bindgen(js_name = logDeletionSetting)]
    pub fn log_deletion_setting(&self) -> Promise {
        let settings = self.settings.clone();
        future_to_promise(async move {
            to_js_value(&settings.log_deletion_setting().await.map_err(to_js)?)
        })
    }

    #[wasm_bindgen(js_name = toggleLogDeletion)]
    pub fn toggle_log_deletion(&self) -> Promise {
        let settings = self.settings.clone();
        future_to_promise(async move {
            to_js_value(&settings.toggle_log_deletion().await.map_err(to_js)?)
        })
    }
}
