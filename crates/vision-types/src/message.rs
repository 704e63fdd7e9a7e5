//! Wire messages exchanged over the realtime data channel.
//!
//! Outbound messages are a tagged union over the client events this console
//! emits. Inbound messages are parsed into the few server events the core
//! reacts to; everything else is kept as [`ServerEvent::Other`] with the raw
//! JSON retained for the event log. Only payloads that are not JSON objects
//! with a `type` are rejected outright.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::caption::CaptionLogEntry;
use crate::tool::ToolDescriptor;
use crate::{Result, VisionError};

pub const FUNCTION_CALL_ARGUMENTS_DONE: &str = "response.function_call_arguments.done";
pub const RESPONSE_DONE: &str = "response.done";
pub const LOG_UPDATE: &str = "log.update";
pub const REMOTE_ERROR: &str = "error";

/// Role of a conversation item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "input_text")]
    InputText { text: String },
    /// Assistant-authored text
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConversationItem {
    #[serde(rename = "message")]
    Message { role: Role, content: Vec<ContentPart> },
    #[serde(rename = "function_call_output")]
    FunctionCallOutput { call_id: String, output: String },
}

/// Session configuration sent with `session.update`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub instructions: Option<String>,
    pub tools: Vec<ToolDescriptor>,
    pub tool_choice: String,
}

/// Client events sent to the realtime API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: ConversationItem },
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionSettings },
    #[serde(rename = "response.create")]
    ResponseCreate,
}

impl ClientEvent {
    pub fn type_name(&self) -> &'static str {
        match self {
            ClientEvent::ConversationItemCreate { .. } => "conversation.item.create",
            ClientEvent::SessionUpdate { .. } => "session.update",
            ClientEvent::ResponseCreate => "response.create",
        }
    }
}

/// An application-originated message on its way to the data channel.
///
/// `timestamp` never reaches the wire: the remote protocol rejects unknown
/// fields, so it is only filled in once the message has been sent and logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub event_id: Option<String>,
    #[serde(skip)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub event: ClientEvent,
}

impl OutboundMessage {
    pub fn new(event: ClientEvent) -> Self {
        Self {
            event_id: None,
            timestamp: None,
            event,
        }
    }

    pub fn text(role: Role, text: impl Into<String>) -> Self {
        let text = text.into();
        let part = match role {
            Role::Assistant => ContentPart::Text { text },
            Role::System | Role::User => ContentPart::InputText { text },
        };
        Self::new(ClientEvent::ConversationItemCreate {
            item: ConversationItem::Message {
                role,
                content: vec![part],
            },
        })
    }

    pub fn system_text(text: impl Into<String>) -> Self {
        Self::text(Role::System, text)
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::text(Role::Assistant, text)
    }

    pub fn response_create() -> Self {
        Self::new(ClientEvent::ResponseCreate)
    }

    pub fn function_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(ClientEvent::ConversationItemCreate {
            item: ConversationItem::FunctionCallOutput {
                call_id: call_id.into(),
                output: output.into(),
            },
        })
    }

    pub fn session_update(
        tools: Vec<ToolDescriptor>,
        tool_choice: impl Into<String>,
        instructions: Option<String>,
    ) -> Self {
        Self::new(ClientEvent::SessionUpdate {
            session: SessionSettings {
                instructions,
                tools,
                tool_choice: tool_choice.into(),
            },
        })
    }

    pub fn with_event_id(mut self, id: impl Into<String>) -> Self {
        self.event_id = Some(id.into());
        self
    }

    pub fn event_type(&self) -> &'static str {
        self.event.type_name()
    }

    /// Text of the first content part, for message items
    pub fn text_content(&self) -> Option<&str> {
        match &self.event {
            ClientEvent::ConversationItemCreate {
                item: ConversationItem::Message { content, .. },
            } => content.first().map(|part| match part {
                ContentPart::InputText { text } | ContentPart::Text { text } => text.as_str(),
            }),
            _ => None,
        }
    }

    /// Serialized form sent on the channel
    pub fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ─── Inbound ─────────────────────────────────────────────────

/// Arguments of a completed function call, as announced by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallRecord {
    pub name: String,
    pub call_id: String,
    #[serde(default)]
    pub arguments: String,
}

/// Body of a `response.done` event
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RemoteError {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Server events the core reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    FunctionCallArgumentsDone(FunctionCallRecord),
    ResponseDone(ResponseSummary),
    LogUpdate(CaptionLogEntry),
    Error(RemoteError),
    /// Any other event type; the payload stays in `InboundMessage::raw`
    Other,
    /// A known event type whose body did not match its shape
    Undecoded(String),
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> serde_json::Result<T> {
    serde_json::from_value(value)
}

/// A message received from the channel (or injected as a caption update).
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub kind: String,
    pub event_id: Option<String>,
    pub timestamp: Option<String>,
    pub event: ServerEvent,
    pub raw: Value,
}

impl InboundMessage {
    pub fn parse(text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text)?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> Result<Self> {
        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| VisionError::Serialization("message has no type field".to_string()))?
            .to_string();

        let event = match kind.as_str() {
            FUNCTION_CALL_ARGUMENTS_DONE => {
                decode(raw.clone()).map(ServerEvent::FunctionCallArgumentsDone)
            }
            RESPONSE_DONE => match raw.get("response").filter(|r| !r.is_null()) {
                Some(response) => decode(response.clone()).map(ServerEvent::ResponseDone),
                None => Ok(ServerEvent::ResponseDone(ResponseSummary::default())),
            },
            LOG_UPDATE => decode(raw.clone()).map(ServerEvent::LogUpdate),
            REMOTE_ERROR => match raw.get("error").filter(|e| !e.is_null()) {
                Some(error) => decode(error.clone()).map(ServerEvent::Error),
                None => Ok(ServerEvent::Error(RemoteError::default())),
            },
            _ => Ok(ServerEvent::Other),
        }
        .unwrap_or_else(|e| ServerEvent::Undecoded(format!("{}: {}", kind, e)));

        Ok(Self {
            event_id: string_field(&raw, "event_id"),
            timestamp: string_field(&raw, "timestamp"),
            kind,
            event,
            raw,
        })
    }

    /// Wrap a caption entry as a `log.update` event.
    pub fn log_update(entry: CaptionLogEntry) -> Self {
        let mut raw = serde_json::to_value(&entry).unwrap_or_else(|_| Value::Object(Default::default()));
        if let Value::Object(map) = &mut raw {
            map.insert("type".to_string(), Value::String(LOG_UPDATE.to_string()));
        }
        let timestamp = Some(entry.timestamp.clone()).filter(|t| !t.is_empty());
        Self {
            kind: LOG_UPDATE.to_string(),
            event_id: None,
            timestamp,
            event: ServerEvent::LogUpdate(entry),
            raw,
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match &self.event {
            ServerEvent::LogUpdate(entry) => Some(entry.caption.as_str()),
            _ => None,
        }
    }
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(String::from)
}
