//! Diagnostic bus between the session core and the app shell.
//!
//! The bus is single-threaded (WASM constraint) and uses interior mutability
//! via RefCell. Notices are buffered and drained by the app on demand.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use vision_types::event::SessionNotice;

/// Shared notice bus, clone-cheap via Rc.
#[derive(Clone)]
pub struct NoticeBus {
    inner: Rc<RefCell<VecDeque<SessionNotice>>>,
}

impl NoticeBus {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    pub fn emit(&self, notice: SessionNotice) {
        self.inner.borrow_mut().push_back(notice);
    }

    /// Drain all pending notices.
    pub fn drain(&self) -> Vec<SessionNotice> {
        self.inner.borrow_mut().drain(..).collect()
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new()
    }
}
