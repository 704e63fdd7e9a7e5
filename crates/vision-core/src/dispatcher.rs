//! Outbound dispatcher: the single funnel for application messages.
//!
//! A message is either transmitted (channel open) and then logged, or queued
//! until the channel opens. Nothing reaches the wire or the log any other way.

use vision_types::{
    Result,
    clock,
    event::LogEntry,
    message::OutboundMessage,
};

use crate::session::SessionHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Sent,
    Queued,
}

#[derive(Clone)]
pub struct Dispatcher {
    session: SessionHandle,
}

impl Dispatcher {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn send(&self, mut message: OutboundMessage) -> Result<Disposition> {
        let Some(channel) = self.session.with(|s| s.open_channel()) else {
            log::debug!("Channel not ready, queueing {}", message.event_type());
            self.session.with_mut(|s| s.queue.enqueue(message));
            return Ok(Disposition::Queued);
        };

        message.event_id.get_or_insert_with(clock::new_event_id);
        let payload = message.to_wire()?;
        channel.send(&payload)?;
        log::debug!(
            "Sent {} ({})",
            message.event_type(),
            message.event_id.as_deref().unwrap_or_default()
        );

        // Timestamp is backfilled by the log, after transmission
        self.session.with_mut(|s| s.log.prepend(LogEntry::Sent(message)));
        Ok(Disposition::Sent)
    }

    /// User text followed by a response request, as two separate sends.
    pub fn send_text_message(&self, text: &str) -> Result<()> {
        self.send(OutboundMessage::user_text(text))?;
        self.send(OutboundMessage::response_create())?;
        Ok(())
    }

    /// Re-submit every queued message in FIFO order.
    /// On a transmission error the unsent remainder goes back to the head.
    pub fn flush_queue(&self) -> Result<usize> {
        let mut pending = self.session.with_mut(|s| s.queue.drain()).into_iter();
        let mut flushed = 0;
        while let Some(message) = pending.next() {
            let retry = message.clone();
            if let Err(e) = self.send(message) {
                log::error!("Queue flush interrupted after {} messages: {}", flushed, e);
                let mut remainder = vec![retry];
                remainder.extend(pending);
                self.session.with_mut(|s| s.queue.restore(remainder));
                return Err(e);
            }
            flushed += 1;
        }
        if flushed > 0 {
            log::info!("Flushed {} queued messages", flushed);
        }
        Ok(flushed)
    }
}
