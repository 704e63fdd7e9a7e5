//! Session controller: lifecycle of the single realtime session.
//!
//! `start()` walks the setup sequence:
//! 1. fetch a short-lived credential
//! 2. construct the peer connection with the configured connectivity hints
//! 3. attach the microphone and create the ordered data channel
//! 4. queue the setup messages (tools, instructions, greeting)
//! 5. offer/answer exchange with the signaling endpoint, bounded by a timeout
//!
//! `run()` then drives the transport events: the channel opening resets the
//! log and flushes the queue, messages go to the reducer, and a degraded
//! connection triggers a bounded, backed-off restart.

use std::fmt;
use std::rc::Rc;

use futures::future::{self, Either};
use futures::StreamExt;
use vision_types::{
    Result, VisionError,
    config::VisionConfig,
    error::StartStage,
    event::{LogEntry, SessionNotice},
    message::OutboundMessage,
    session::SessionStatus,
};

use crate::captions::CaptionFeed;
use crate::dispatcher::{Dispatcher, Disposition};
use crate::functions::FunctionTable;
use crate::notice_bus::NoticeBus;
use crate::ports::*;
use crate::reducer::Reducer;
use crate::session::SessionHandle;

/// Adapters the controller drives
#[derive(Clone)]
pub struct SessionPorts {
    pub token: Rc<dyn TokenPort>,
    pub signaling: Rc<dyn SignalingPort>,
    pub connector: Rc<dyn PeerConnector>,
    pub timer: Rc<dyn TimerPort>,
}

/// A negotiated session and its transport events
pub struct Session {
    generation: u64,
    events: TransportEvents,
}

impl Session {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.next().await
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Continue,
    /// Connectivity failed; the session must be restarted
    Degraded,
    Ended,
}

pub struct SessionController {
    config: VisionConfig,
    ports: SessionPorts,
    session: SessionHandle,
    reducer: Rc<Reducer>,
}

impl SessionController {
    pub fn new(
        config: VisionConfig,
        ports: SessionPorts,
        functions: FunctionTable,
        notices: NoticeBus,
    ) -> Self {
        let session = SessionHandle::new(notices);
        let dispatcher = Dispatcher::new(session.clone());
        let reducer = Rc::new(Reducer::new(dispatcher, Rc::new(functions)));
        Self {
            config,
            ports,
            session,
            reducer,
        }
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        self.reducer.dispatcher()
    }

    pub fn reducer(&self) -> Rc<Reducer> {
        self.reducer.clone()
    }

    pub fn caption_feed(&self, port: Rc<dyn CaptionPort>) -> CaptionFeed {
        CaptionFeed::new(port, self.reducer.clone())
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn events(&self) -> Vec<LogEntry> {
        self.session.events()
    }

    pub fn send(&self, message: OutboundMessage) -> Result<Disposition> {
        self.dispatcher().send(message)
    }

    pub fn send_text_message(&self, text: &str) -> Result<()> {
        self.dispatcher().send_text_message(text)
    }

    // ─── Start ───────────────────────────────────────────────

    /// Establish a new session. Fails with `AlreadyActive` while another
    /// session is connecting or running; on any other failure everything
    /// acquired so far is released before the error is returned.
    pub async fn start(&self) -> Result<Session> {
        let generation = self.session.with_mut(|s| {
            if s.status.is_busy() || s.peer.is_some() {
                return Err(VisionError::AlreadyActive);
            }
            s.generation += 1;
            if !s.queue.is_empty() {
                log::debug!("Discarding {} messages queued outside a session", s.queue.len());
                s.queue.clear();
            }
            Ok(s.generation)
        })?;

        log::info!("Starting realtime session #{}", generation);
        self.session.set_status(SessionStatus::Connecting);

        match self.establish(generation).await {
            Ok(session) => {
                self.session.set_status(SessionStatus::AwaitingChannel);
                Ok(session)
            }
            Err(VisionError::Cancelled) => {
                log::info!("Session start #{} superseded", generation);
                Err(VisionError::Cancelled)
            }
            Err(e) => {
                log::error!("Session start failed: {}", e);
                if self.session.is_current(generation) {
                    self.teardown();
                    self.session.set_status(SessionStatus::Failed(e.to_string()));
                }
                self.session.notify(SessionNotice::StartFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn establish(&self, generation: u64) -> Result<Session> {
        let token = self
            .ports
            .token
            .fetch_token()
            .await
            .map_err(|e| e.at_stage(StartStage::Token))?;
        self.ensure_current(generation)?;

        let peer = self
            .ports
            .connector
            .connect(&self.config.peer)
            .await
            .map_err(|e| e.at_stage(StartStage::Transport))?;
        if !self.session.is_current(generation) {
            peer.close();
            return Err(VisionError::Cancelled);
        }
        // Owned by the session from here on, so any failure releases it
        self.session.with_mut(|s| s.peer = Some(peer.clone()));
        let events = peer.take_events().ok_or_else(|| VisionError::SessionStart {
            stage: StartStage::Transport,
            message: "transport event stream already taken".to_string(),
        })?;

        peer.attach_microphone()
            .await
            .map_err(|e| e.at_stage(StartStage::Media))?;
        self.ensure_current(generation)?;

        let channel = peer
            .create_channel(&self.config.realtime.channel_label)
            .map_err(|e| e.at_stage(StartStage::Channel))?;
        self.session.with_mut(|s| s.channel = Some(channel));

        self.queue_setup_messages();

        let offer = peer
            .create_offer()
            .await
            .map_err(|e| e.at_stage(StartStage::Offer))?;
        self.ensure_current(generation)?;

        let answer = self
            .exchange_with_timeout(&offer, &token)
            .await
            .map_err(|e| e.at_stage(StartStage::Signaling))?;
        self.ensure_current(generation)?;

        peer.apply_answer(&answer)
            .await
            .map_err(|e| e.at_stage(StartStage::Answer))?;
        self.ensure_current(generation)?;

        Ok(Session { generation, events })
    }

    fn ensure_current(&self, generation: u64) -> Result<()> {
        if self.session.is_current(generation) {
            Ok(())
        } else {
            Err(VisionError::Cancelled)
        }
    }

    /// Tool descriptors, instructions and greeting. The channel is not open
    /// yet, so these wait in the queue and lead the new session's log.
    fn queue_setup_messages(&self) {
        let mut setup = vec![
            OutboundMessage::session_update(
                self.reducer.functions().descriptors(),
                self.config.tool_choice.clone(),
                None,
            ),
            OutboundMessage::system_text(self.config.instructions.clone()),
        ];
        if let Some(greeting) = &self.config.greeting {
            setup.push(OutboundMessage::assistant_text(greeting.clone()));
        }
        for message in setup {
            if let Err(e) = self.dispatcher().send(message) {
                log::warn!("Failed to queue setup message: {}", e);
            }
        }
    }

    async fn exchange_with_timeout(&self, offer: &str, token: &str) -> Result<String> {
        let timeout_ms = self.config.realtime.signaling_timeout_ms;
        let exchange = self.ports.signaling.exchange(offer, token);
        let deadline = self.ports.timer.sleep(timeout_ms);
        match future::select(exchange, deadline).await {
            Either::Left((answer, _)) => answer,
            Either::Right(((), _)) => Err(VisionError::Timeout(timeout_ms)),
        }
    }

    // ─── Stop ────────────────────────────────────────────────

    /// Tear the session down. Safe to call repeatedly, or on a session that
    /// never finished starting. In-flight handlers are not awaited; their
    /// output is discarded when they notice the session changed.
    pub fn stop(&self) {
        if self.teardown() {
            log::info!("Session stopped");
        }
        self.session.set_status(SessionStatus::Idle);
    }

    /// Release the transport and invalidate in-flight work.
    /// Returns whether anything was released.
    fn teardown(&self) -> bool {
        let (channel, peer) = self.session.with_mut(|s| {
            s.generation += 1;
            s.queue.clear();
            (s.channel.take(), s.peer.take())
        });
        let released = channel.is_some() || peer.is_some();
        if let Some(channel) = channel {
            if channel.is_open() {
                channel.close();
            }
        }
        if let Some(peer) = peer {
            peer.stop_tracks();
            if !peer.is_closed() {
                peer.close();
            }
        }
        released
    }

    // ─── Event loop ──────────────────────────────────────────

    /// Apply one transport event of the session stamped `generation`.
    pub async fn handle_event(&self, generation: u64, event: TransportEvent) -> EventOutcome {
        if !self.session.is_current(generation) {
            log::debug!("Ignoring event from a stale session: {:?}", event);
            return EventOutcome::Ended;
        }

        match event {
            TransportEvent::ChannelOpen => {
                log::info!("Data channel open");
                // Fresh log first, so the flushed setup messages lead it
                self.session.with_mut(|s| {
                    s.log.clear();
                    s.restart_streak = 0;
                });
                self.session.set_status(SessionStatus::Active);
                if let Err(e) = self.dispatcher().flush_queue() {
                    log::error!("Failed to flush queued messages: {}", e);
                }
                EventOutcome::Continue
            }
            TransportEvent::ChannelMessage(payload) => {
                self.reducer.reduce(&payload).await;
                EventOutcome::Continue
            }
            TransportEvent::ChannelClose => {
                log::info!("Data channel closed by the remote side");
                self.session.notify(SessionNotice::ChannelClosed);
                self.stop();
                EventOutcome::Ended
            }
            TransportEvent::ChannelError(message) => {
                log::error!("Data channel error: {}", message);
                self.session.notify(SessionNotice::ChannelError { message });
                EventOutcome::Continue
            }
            TransportEvent::ConnectionState(state) => {
                log::info!("Connection state: {:?}", state);
                self.session
                    .notify(SessionNotice::ConnectionStateChanged { state });
                if state.is_degraded() {
                    EventOutcome::Degraded
                } else {
                    EventOutcome::Continue
                }
            }
        }
    }

    /// Drive a session until it ends, restarting it when connectivity degrades.
    pub async fn run(&self, mut session: Session) -> Result<()> {
        loop {
            let outcome = loop {
                let Some(event) = session.next_event().await else {
                    break EventOutcome::Ended;
                };
                match self.handle_event(session.generation, event).await {
                    EventOutcome::Continue => {}
                    outcome => break outcome,
                }
            };

            match outcome {
                EventOutcome::Degraded => match self.restart().await {
                    Ok(next) => session = next,
                    // a newer start or stop owns the session now
                    Err(VisionError::Cancelled) => return Ok(()),
                    Err(e) => return Err(e),
                },
                _ => return Ok(()),
            }
        }
    }

    /// Full stop, then up to `max_attempts` backed-off starts. The attempt
    /// count only resets once a channel opens, so a connection that keeps
    /// failing right after setup cannot restart forever.
    pub async fn restart(&self) -> Result<Session> {
        log::warn!("Connection degraded, restarting session");
        self.teardown();
        let policy = self.config.restart.clone();

        loop {
            let (attempt, generation) = self.session.with_mut(|s| {
                s.restart_streak += 1;
                (s.restart_streak, s.generation)
            });

            if attempt > policy.max_attempts {
                log::error!("Giving up after {} restart attempts", policy.max_attempts);
                self.session.with_mut(|s| s.restart_streak = 0);
                self.session.notify(SessionNotice::RestartAbandoned {
                    attempts: policy.max_attempts,
                });
                self.session.set_status(SessionStatus::Failed(
                    "connection lost; restart abandoned".to_string(),
                ));
                return Err(VisionError::RestartExhausted(policy.max_attempts));
            }

            let delay_ms = policy.delay_for(attempt);
            self.session.set_status(SessionStatus::Restarting { attempt });
            self.session
                .notify(SessionNotice::RestartScheduled { attempt, delay_ms });
            self.ports.timer.sleep(delay_ms).await;

            if !self.session.is_current(generation) {
                log::info!("Restart cancelled by a newer start or stop");
                return Err(VisionError::Cancelled);
            }

            match self.start().await {
                Ok(session) => return Ok(session),
                Err(VisionError::Cancelled) => return Err(VisionError::Cancelled),
                Err(e) => log::warn!("Restart attempt {} failed: {}", attempt, e),
            }
        }
    }
}
