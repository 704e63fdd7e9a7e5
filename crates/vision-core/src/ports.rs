//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `vision-core` (pure Rust).
//! Implementations live in `vision-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use std::pin::Pin;
use std::rc::Rc;
use async_trait::async_trait;
use futures::Stream;
use vision_types::{
    Result,
    config::PeerOptions,
    session::ConnectionState,
};

// ─── Credential Port ─────────────────────────────────────────

#[async_trait(?Send)]
pub trait TokenPort {
    /// Fetch a short-lived credential for the signaling exchange
    async fn fetch_token(&self) -> Result<String>;
}

// ─── Signaling Port ──────────────────────────────────────────

#[async_trait(?Send)]
pub trait SignalingPort {
    /// Send the local offer, receive the remote answer (both SDP text)
    async fn exchange(&self, offer_sdp: &str, token: &str) -> Result<String>;
}

// ─── Transport Ports ─────────────────────────────────────────

/// Everything the transport reports, delivered in order on one stream
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    ChannelOpen,
    ChannelMessage(String),
    ChannelClose,
    ChannelError(String),
    ConnectionState(ConnectionState),
}

pub type TransportEvents = Pin<Box<dyn Stream<Item = TransportEvent>>>;

#[async_trait(?Send)]
pub trait PeerConnector {
    /// Construct a fresh peer connection with the given connectivity hints
    async fn connect(&self, options: &PeerOptions) -> Result<Rc<dyn PeerConnection>>;
}

#[async_trait(?Send)]
pub trait PeerConnection {
    /// Take the event stream. Returns `None` after the first call.
    fn take_events(&self) -> Option<TransportEvents>;

    /// Acquire the microphone and add its track to the connection
    async fn attach_microphone(&self) -> Result<()>;

    /// Create the single ordered data channel
    fn create_channel(&self, label: &str) -> Result<Rc<dyn DataChannel>>;

    /// Create the local offer, apply it, and return its SDP
    async fn create_offer(&self) -> Result<String>;

    /// Apply the remote answer SDP
    async fn apply_answer(&self, sdp: &str) -> Result<()>;

    /// Stop every local media track
    fn stop_tracks(&self);

    fn close(&self);

    fn is_closed(&self) -> bool;
}

pub trait DataChannel {
    fn send(&self, payload: &str) -> Result<()>;

    fn is_open(&self) -> bool;

    fn close(&self);
}

// ─── Timer Port ──────────────────────────────────────────────

#[async_trait(?Send)]
pub trait TimerPort {
    async fn sleep(&self, ms: u64);
}

// ─── Caption Port ────────────────────────────────────────────

#[async_trait(?Send)]
pub trait CaptionPort {
    /// Caption one encoded frame
    async fn analyze_frame(&self, frame: &[u8], mime_type: &str) -> Result<String>;
}
