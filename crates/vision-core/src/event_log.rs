use std::collections::VecDeque;
use vision_types::clock;
use vision_types::event::LogEntry;

/// Most-recent-first record of every message sent or received in a session.
///
/// Entries are never mutated after insertion; the only write is the
/// timestamp backfill performed by [`EventLog::prepend`].
#[derive(Debug, Default)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the entry if it has no timestamp yet, then put it at the head.
    pub fn prepend(&mut self, mut entry: LogEntry) {
        match &mut entry {
            LogEntry::Sent(msg) => {
                msg.timestamp.get_or_insert_with(clock::time_label);
            }
            LogEntry::Received(msg) => {
                msg.timestamp.get_or_insert_with(clock::time_label);
            }
        }
        self.entries.push_front(entry);
    }

    /// Up to `count` entries, most recent first
    pub fn latest(&self, count: usize) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().take(count)
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
