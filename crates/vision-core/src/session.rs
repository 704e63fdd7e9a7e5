//! Shared session state.
//!
//! Every component (dispatcher, reducer, controller) reaches the same named
//! fields through a [`SessionHandle`]. Borrows are never held across an
//! `.await`; anything that suspends re-checks [`SessionHandle::is_current`]
//! afterwards.

use std::cell::RefCell;
use std::rc::Rc;

use vision_types::{
    event::{LogEntry, SessionNotice},
    session::SessionStatus,
};

use crate::event_log::EventLog;
use crate::notice_bus::NoticeBus;
use crate::ports::{DataChannel, PeerConnection};
use crate::queue::MessageQueue;

pub struct SessionState {
    pub status: SessionStatus,
    /// Bumped by every start and stop; stale work compares against it
    pub generation: u64,
    pub peer: Option<Rc<dyn PeerConnection>>,
    pub channel: Option<Rc<dyn DataChannel>>,
    pub queue: MessageQueue,
    pub log: EventLog,
    /// Consecutive restart attempts since a channel last opened
    pub restart_streak: u32,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            generation: 0,
            peer: None,
            channel: None,
            queue: MessageQueue::new(),
            log: EventLog::new(),
            restart_streak: 0,
        }
    }

    /// The channel, if it can transmit right now
    pub fn open_channel(&self) -> Option<Rc<dyn DataChannel>> {
        self.channel.as_ref().filter(|c| c.is_open()).cloned()
    }
}

/// Clone-cheap handle to the session state and its notice bus.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Rc<RefCell<SessionState>>,
    notices: NoticeBus,
}

impl SessionHandle {
    pub fn new(notices: NoticeBus) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SessionState::new())),
            notices,
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.inner.borrow())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }

    pub fn notices(&self) -> &NoticeBus {
        &self.notices
    }

    pub fn notify(&self, notice: SessionNotice) {
        self.notices.emit(notice);
    }

    pub fn generation(&self) -> u64 {
        self.inner.borrow().generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.borrow().status.clone()
    }

    pub fn is_active(&self) -> bool {
        self.inner.borrow().status == SessionStatus::Active
    }

    pub fn set_status(&self, status: SessionStatus) {
        let changed = {
            let mut state = self.inner.borrow_mut();
            if state.status == status {
                false
            } else {
                state.status = status.clone();
                true
            }
        };
        if changed {
            log::info!("Session status: {}", status.label());
            self.notices.emit(SessionNotice::StatusChanged { status });
        }
    }

    /// Copy of the `count` most recent log entries
    pub fn recent_events(&self, count: usize) -> Vec<LogEntry> {
        self.inner.borrow().log.latest(count).cloned().collect()
    }

    pub fn events(&self) -> Vec<LogEntry> {
        self.inner.borrow().log.entries().cloned().collect()
    }

    pub fn queued_len(&self) -> usize {
        self.inner.borrow().queue.len()
    }
}
