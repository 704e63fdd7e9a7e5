//! WebRTC transport adapter.
//!
//! Architecture:
//! - One `RTCPeerConnection` per session, remote audio played through a
//!   detached autoplay `<audio>` element
//! - One ordered `RTCDataChannel` carrying the JSON event traffic
//! - Every browser callback (channel open/message/close/error, connection
//!   state) is forwarded into a single mpsc stream, so the core sees the
//!   transport as one ordered sequence of `TransportEvent`s
//!
//! Callbacks are detached before the JS objects are released, so a late
//! browser event never reaches a dropped closure.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::mpsc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    HtmlAudioElement, MediaStream, MediaStreamConstraints, MediaStreamTrack, MessageEvent,
    RtcBundlePolicy, RtcConfiguration, RtcDataChannel, RtcDataChannelInit, RtcDataChannelState,
    RtcIceServer, RtcPeerConnection, RtcPeerConnectionState, RtcSdpType,
    RtcSessionDescriptionInit, RtcSignalingState, RtcTrackEvent,
};

use vision_core::ports::{DataChannel, PeerConnection, PeerConnector, TransportEvent, TransportEvents};
use vision_types::{
    Result, VisionError,
    config::{BundlePolicy, PeerOptions},
    session::ConnectionState,
};

use crate::js_error;

type EventSender = Rc<RefCell<Option<mpsc::UnboundedSender<TransportEvent>>>>;
type Handler = Closure<dyn FnMut(JsValue)>;

fn emit(sender: &EventSender, event: TransportEvent) {
    if let Some(tx) = sender.borrow().as_ref() {
        let _ = tx.unbounded_send(event);
    }
}

pub fn connection_state_from(state: RtcPeerConnectionState) -> ConnectionState {
    match state {
        RtcPeerConnectionState::New => ConnectionState::New,
        RtcPeerConnectionState::Connecting => ConnectionState::Connecting,
        RtcPeerConnectionState::Connected => ConnectionState::Connected,
        RtcPeerConnectionState::Disconnected => ConnectionState::Disconnected,
        RtcPeerConnectionState::Failed => ConnectionState::Failed,
        RtcPeerConnectionState::Closed => ConnectionState::Closed,
        _ => ConnectionState::New,
    }
}

pub fn bundle_policy(policy: BundlePolicy) -> RtcBundlePolicy {
    match policy {
        BundlePolicy::Balanced => RtcBundlePolicy::Balanced,
        BundlePolicy::MaxCompat => RtcBundlePolicy::MaxCompat,
        BundlePolicy::MaxBundle => RtcBundlePolicy::MaxBundle,
    }
}

fn rtc_configuration(options: &PeerOptions) -> RtcConfiguration {
    let urls = js_sys::Array::new();
    for url in &options.ice_servers {
        urls.push(&JsValue::from_str(url));
    }
    let server = RtcIceServer::new();
    server.set_urls(&urls);

    let config = RtcConfiguration::new();
    if !options.ice_servers.is_empty() {
        config.set_ice_servers(&js_sys::Array::of1(&server));
    }
    config.set_bundle_policy(bundle_policy(options.bundle_policy));
    config
}

// ─── Connector ───────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserPeerConnector;

#[async_trait(?Send)]
impl PeerConnector for BrowserPeerConnector {
    async fn connect(&self, options: &PeerOptions) -> Result<Rc<dyn PeerConnection>> {
        let pc = RtcPeerConnection::new_with_configuration(&rtc_configuration(options))
            .map_err(js_error)?;
        let peer = BrowserPeerConnection::new(pc)?;
        log::info!("Peer connection created ({} ICE servers)", options.ice_servers.len());
        Ok(Rc::new(peer))
    }
}

// ─── Peer Connection ─────────────────────────────────────

pub struct BrowserPeerConnection {
    pc: RtcPeerConnection,
    sender: EventSender,
    events: RefCell<Option<TransportEvents>>,
    audio: HtmlAudioElement,
    tracks: RefCell<Vec<MediaStreamTrack>>,
    handlers: RefCell<Vec<Handler>>,
}

impl BrowserPeerConnection {
    fn new(pc: RtcPeerConnection) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded();
        let sender: EventSender = Rc::new(RefCell::new(Some(tx)));

        let audio = HtmlAudioElement::new().map_err(js_error)?;
        audio.set_autoplay(true);

        let ontrack = {
            let audio = audio.clone();
            Closure::wrap(Box::new(move |event: JsValue| {
                let event: RtcTrackEvent = event.unchecked_into();
                if let Ok(stream) = event.streams().get(0).dyn_into::<MediaStream>() {
                    audio.set_src_object(Some(&stream));
                    log::debug!("Remote audio attached");
                }
            }) as Box<dyn FnMut(JsValue)>)
        };
        pc.set_ontrack(Some(ontrack.as_ref().unchecked_ref()));

        let onstatechange = {
            let pc = pc.clone();
            let sender = sender.clone();
            Closure::wrap(Box::new(move |_event: JsValue| {
                let state = connection_state_from(pc.connection_state());
                emit(&sender, TransportEvent::ConnectionState(state));
            }) as Box<dyn FnMut(JsValue)>)
        };
        pc.set_onconnectionstatechange(Some(onstatechange.as_ref().unchecked_ref()));

        Ok(Self {
            pc,
            sender,
            events: RefCell::new(Some(Box::pin(rx))),
            audio,
            tracks: RefCell::new(Vec::new()),
            handlers: RefCell::new(vec![ontrack, onstatechange]),
        })
    }

    fn detach_handlers(&self) {
        self.pc.set_ontrack(None);
        self.pc.set_onconnectionstatechange(None);
        self.handlers.borrow_mut().clear();
    }
}

#[async_trait(?Send)]
impl PeerConnection for BrowserPeerConnection {
    fn take_events(&self) -> Option<TransportEvents> {
        self.events.borrow_mut().take()
    }

    async fn attach_microphone(&self) -> Result<()> {
        let window = web_sys::window()
            .ok_or_else(|| VisionError::JsInterop("no window".to_string()))?;
        let devices = window.navigator().media_devices().map_err(js_error)?;

        let constraints = MediaStreamConstraints::new();
        constraints.set_audio(&JsValue::TRUE);
        let promise = devices
            .get_user_media_with_constraints(&constraints)
            .map_err(js_error)?;
        let stream: MediaStream = JsFuture::from(promise)
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;

        let tracks: Vec<MediaStreamTrack> = stream
            .get_tracks()
            .iter()
            .filter_map(|t| t.dyn_into::<MediaStreamTrack>().ok())
            .collect();
        let track = tracks
            .first()
            .ok_or_else(|| VisionError::Transport("microphone stream has no audio track".to_string()))?;
        self.pc.add_track_0(track, &stream);
        self.tracks.borrow_mut().extend(tracks);
        log::info!("Microphone attached");
        Ok(())
    }

    fn create_channel(&self, label: &str) -> Result<Rc<dyn DataChannel>> {
        let init = RtcDataChannelInit::new();
        init.set_ordered(true);
        let channel = self.pc.create_data_channel_with_data_channel_dict(label, &init);
        Ok(Rc::new(BrowserDataChannel::new(channel, self.sender.clone())))
    }

    async fn create_offer(&self) -> Result<String> {
        let offer = JsFuture::from(self.pc.create_offer()).await.map_err(js_error)?;
        let sdp = js_sys::Reflect::get(&offer, &JsValue::from_str("sdp"))
            .map_err(js_error)?
            .as_string()
            .ok_or_else(|| VisionError::Transport("offer has no SDP".to_string()))?;

        let description = RtcSessionDescriptionInit::new(RtcSdpType::Offer);
        description.set_sdp(&sdp);
        JsFuture::from(self.pc.set_local_description(&description))
            .await
            .map_err(js_error)?;
        Ok(sdp)
    }

    async fn apply_answer(&self, sdp: &str) -> Result<()> {
        let description = RtcSessionDescriptionInit::new(RtcSdpType::Answer);
        description.set_sdp(sdp);
        JsFuture::from(self.pc.set_remote_description(&description))
            .await
            .map_err(js_error)?;
        log::debug!("Remote answer applied");
        Ok(())
    }

    fn stop_tracks(&self) {
        for track in self.tracks.borrow_mut().drain(..) {
            track.stop();
        }
        self.audio.set_src_object(None);
    }

    fn close(&self) {
        self.detach_handlers();
        self.pc.close();
        // Ends the event stream
        self.sender.borrow_mut().take();
    }

    fn is_closed(&self) -> bool {
        self.pc.signaling_state() == RtcSignalingState::Closed
    }
}

impl Drop for BrowserPeerConnection {
    fn drop(&mut self) {
        self.detach_handlers();
    }
}

// ─── Data Channel ────────────────────────────────────────

pub struct BrowserDataChannel {
    channel: RtcDataChannel,
    handlers: RefCell<Vec<Handler>>,
}

impl BrowserDataChannel {
    fn new(channel: RtcDataChannel, sender: EventSender) -> Self {
        let onopen = {
            let sender = sender.clone();
            Closure::wrap(Box::new(move |_event: JsValue| {
                emit(&sender, TransportEvent::ChannelOpen);
            }) as Box<dyn FnMut(JsValue)>)
        };
        channel.set_onopen(Some(onopen.as_ref().unchecked_ref()));

        let onmessage = {
            let sender = sender.clone();
            Closure::wrap(Box::new(move |event: JsValue| {
                let event: MessageEvent = event.unchecked_into();
                match event.data().as_string() {
                    Some(text) => emit(&sender, TransportEvent::ChannelMessage(text)),
                    None => log::warn!("Ignoring non-text data channel message"),
                }
            }) as Box<dyn FnMut(JsValue)>)
        };
        channel.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

        let onclose = {
            let sender = sender.clone();
            Closure::wrap(Box::new(move |_event: JsValue| {
                emit(&sender, TransportEvent::ChannelClose);
            }) as Box<dyn FnMut(JsValue)>)
        };
        channel.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        let onerror = Closure::wrap(Box::new(move |event: JsValue| {
            emit(&sender, TransportEvent::ChannelError(channel_error_message(&event)));
        }) as Box<dyn FnMut(JsValue)>);
        channel.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        Self {
            channel,
            handlers: RefCell::new(vec![onopen, onmessage, onclose, onerror]),
        }
    }

    fn detach_handlers(&self) {
        self.channel.set_onopen(None);
        self.channel.set_onmessage(None);
        self.channel.set_onclose(None);
        self.channel.set_onerror(None);
        self.handlers.borrow_mut().clear();
    }
}

/// `RTCErrorEvent.error.message`, when the browser provides one
fn channel_error_message(event: &JsValue) -> String {
    js_sys::Reflect::get(event, &JsValue::from_str("error"))
        .ok()
        .and_then(|error| js_sys::Reflect::get(&error, &JsValue::from_str("message")).ok())
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| "data channel error".to_string())
}

impl DataChannel for BrowserDataChannel {
    fn send(&self, payload: &str) -> Result<()> {
        self.channel
            .send_with_str(payload)
            .map_err(|e| VisionError::Transport(format!("send failed: {:?}", e)))
    }

    fn is_open(&self) -> bool {
        self.channel.ready_state() == RtcDataChannelState::Open
    }

    fn close(&self) {
        self.detach_handlers();
        self.channel.close();
    }
}

impl Drop for BrowserDataChannel {
    fn drop(&mut self) {
        self.detach_handlers();
    }
}
