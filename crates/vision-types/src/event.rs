use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{ClientEvent, ConversationItem, InboundMessage, OutboundMessage};
use crate::session::{ConnectionState, SessionStatus};

/// One entry of the session event log.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    Sent(OutboundMessage),
    Received(InboundMessage),
}

impl LogEntry {
    pub fn event_type(&self) -> &str {
        match self {
            LogEntry::Sent(msg) => msg.event_type(),
            LogEntry::Received(msg) => &msg.kind,
        }
    }

    pub fn timestamp(&self) -> Option<&str> {
        match self {
            LogEntry::Sent(msg) => msg.timestamp.as_deref(),
            LogEntry::Received(msg) => msg.timestamp.as_deref(),
        }
    }

    pub fn event_id(&self) -> Option<&str> {
        match self {
            LogEntry::Sent(msg) => msg.event_id.as_deref(),
            LogEntry::Received(msg) => msg.event_id.as_deref(),
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match self {
            LogEntry::Sent(_) => None,
            LogEntry::Received(msg) => msg.caption(),
        }
    }

    /// Message-item content, else response output, else the whole event.
    pub fn content(&self) -> Value {
        match self {
            LogEntry::Sent(msg) => match &msg.event {
                ClientEvent::ConversationItemCreate {
                    item: ConversationItem::Message { content, .. },
                } => serde_json::to_value(content).unwrap_or(Value::Null),
                _ => self.to_json(),
            },
            LogEntry::Received(msg) => {
                let item_content = &msg.raw["item"]["content"];
                let output = &msg.raw["response"]["output"];
                if !item_content.is_null() {
                    item_content.clone()
                } else if !output.is_null() {
                    output.clone()
                } else {
                    msg.raw.clone()
                }
            }
        }
    }

    /// JSON view including the local timestamp
    pub fn to_json(&self) -> Value {
        let mut value = match self {
            LogEntry::Sent(msg) => serde_json::to_value(msg).unwrap_or(Value::Null),
            LogEntry::Received(msg) => msg.raw.clone(),
        };
        if let (Value::Object(map), Some(ts)) = (&mut value, self.timestamp()) {
            map.insert("timestamp".to_string(), Value::String(ts.to_string()));
        }
        value
    }

    pub fn summary(&self) -> LogSummary {
        LogSummary {
            kind: self.event_type().to_string(),
            timestamp: self.timestamp().unwrap_or_default().to_string(),
            content: self.content(),
        }
    }
}

/// Projection of a log entry returned by the `getLogs` function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: String,
    pub content: Value,
}

/// Diagnostics emitted by the session core.
/// The app drains these for display; they never interrupt the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "notice")]
pub enum SessionNotice {
    StatusChanged { status: SessionStatus },
    ConnectionStateChanged { state: ConnectionState },
    ChannelClosed,
    ChannelError { message: String },
    MalformedMessage { message: String },
    FunctionFailed { name: String, message: String },
    StaleOutputDropped { name: String, call_id: String },
    RestartScheduled { attempt: u32, delay_ms: u64 },
    RestartAbandoned { attempts: u32 },
    ResponseCompleted { output_items: usize },
    RemoteError { message: String },
    StartFailed { message: String },
}
