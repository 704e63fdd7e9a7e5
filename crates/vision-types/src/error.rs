use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum VisionError {
    #[error("Session start failed at {stage}: {message}")]
    SessionStart { stage: StartStage, message: String },

    #[error("A session is already active or connecting")]
    AlreadyActive,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Function error: {name}: {message}")]
    Function { name: String, message: String },

    #[error("Caption error: {0}")]
    Caption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Cancelled")]
    Cancelled,

    #[error("Restart abandoned after {0} attempts")]
    RestartExhausted(u32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JS interop error: {0}")]
    JsInterop(String),

    #[error("{0}")]
    Other(String),
}

impl VisionError {
    /// Wrap any error as a start failure at the given stage.
    /// Cancellation and an already-running session pass through unchanged.
    pub fn at_stage(self, stage: StartStage) -> Self {
        match self {
            VisionError::Cancelled
            | VisionError::AlreadyActive
            | VisionError::SessionStart { .. } => self,
            other => VisionError::SessionStart {
                stage,
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for VisionError {
    fn from(e: serde_json::Error) -> Self {
        VisionError::Serialization(e.to_string())
    }
}

/// Step of `start()` that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStage {
    Token,
    Transport,
    Media,
    Channel,
    Offer,
    Signaling,
    Answer,
}

impl fmt::Display for StartStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StartStage::Token => "token",
            StartStage::Transport => "transport",
            StartStage::Media => "media",
            StartStage::Channel => "channel",
            StartStage::Offer => "offer",
            StartStage::Signaling => "signaling",
            StartStage::Answer => "answer",
        };
        f.write_str(label)
    }
}
