use serde::{Deserialize, Serialize};

/// Lifecycle of the (single) realtime session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Idle,
    Connecting,
    /// Negotiated; waiting for the data channel to open
    AwaitingChannel,
    Active,
    Restarting { attempt: u32 },
    Failed(String),
}

impl SessionStatus {
    /// A transport exists or is being acquired
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SessionStatus::Connecting | SessionStatus::AwaitingChannel | SessionStatus::Active
        )
    }

    /// No session exists and none is being set up
    pub fn is_dormant(&self) -> bool {
        matches!(self, SessionStatus::Idle | SessionStatus::Failed(_))
    }

    pub fn label(&self) -> &str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Connecting => "connecting",
            SessionStatus::AwaitingChannel => "awaiting channel",
            SessionStatus::Active => "active",
            SessionStatus::Restarting { .. } => "restarting",
            SessionStatus::Failed(_) => "failed",
        }
    }
}

/// Connectivity reported by the peer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl ConnectionState {
    /// Transitions that trigger an automatic restart
    pub fn is_degraded(&self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Failed)
    }
}

/// Server-side flags, owned by the server and only toggled from the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiSetting {
    pub is_gemini_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDeletionSetting {
    pub should_delete_logs: bool,
}
