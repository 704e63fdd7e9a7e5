use std::collections::VecDeque;
use vision_types::message::OutboundMessage;

/// FIFO of outbound messages waiting for the channel to open.
#[derive(Debug, Default)]
pub struct MessageQueue {
    pending: VecDeque<OutboundMessage>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, message: OutboundMessage) {
        self.pending.push_back(message);
    }

    /// Remove and return everything, head first
    pub fn drain(&mut self) -> Vec<OutboundMessage> {
        self.pending.drain(..).collect()
    }

    /// Put messages back at the head, keeping their relative order
    pub fn restore(&mut self, messages: Vec<OutboundMessage>) {
        for message in messages.into_iter().rev() {
            self.pending.push_front(message);
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &OutboundMessage> {
        self.pending.iter()
    }
}
