use serde::{Deserialize, Serialize};

/// Top-level console configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub realtime: RealtimeConfig,
    pub peer: PeerOptions,
    pub restart: RestartPolicy,
    pub captions: CaptionConfig,
    /// Initial system instructions, queued at every session start
    pub instructions: String,
    /// Assistant greeting queued after the instructions
    pub greeting: Option<String>,
    pub tool_choice: String,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            realtime: RealtimeConfig::default(),
            peer: PeerOptions::default(),
            restart: RestartPolicy::default(),
            captions: CaptionConfig::default(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            greeting: Some(DEFAULT_GREETING.to_string()),
            tool_choice: "auto".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    pub token_url: String,
    pub base_url: String,
    pub model: String,
    pub channel_label: String,
    pub signaling_timeout_ms: u64,
}

impl RealtimeConfig {
    pub fn signaling_url(&self) -> String {
        format!("{}?model={}", self.base_url, self.model)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            token_url: "/token".to_string(),
            base_url: "https://api.openai.com/v1/realtime".to_string(),
            model: "gpt-4o-realtime-preview-2024-12-17".to_string(),
            channel_label: "oai-events".to_string(),
            signaling_timeout_ms: 10_000,
        }
    }
}

/// Connectivity hints handed to the peer connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerOptions {
    pub ice_servers: Vec<String>,
    pub bundle_policy: BundlePolicy,
}

impl Default for PeerOptions {
    fn default() -> Self {
        Self {
            ice_servers: vec!["stun:stun.l.google.com:19302".to_string()],
            bundle_policy: BundlePolicy::MaxBundle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BundlePolicy {
    Balanced,
    MaxCompat,
    MaxBundle,
}

/// Bounded exponential backoff for automatic restarts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RestartPolicy {
    /// Delay before the given attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(32);
        self.initial_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms)
    }
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    pub analyze_url: String,
    /// Capture cadence used by the frame source
    pub interval_ms: u64,
    pub settings_base: String,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            analyze_url: "/api/analyze-frame".to_string(),
            interval_ms: 2_000,
            settings_base: "/api".to_string(),
        }
    }
}

const DEFAULT_INSTRUCTIONS: &str = r#"You are a helpful AI assistant that gives conversational descriptions of what you see through the user's camera.
Image captions arrive continuously and will be added to this conversation as system messages.

Your role is to:
- Describe what you see in a natural, conversational way
- Update your understanding of the scene as new captions arrive
- Engage in dialogue about the scene and its context
- Notice changes in the environment or the person's state

Keep a friendly and engaging tone."#;

const DEFAULT_GREETING: &str =
    "Hello! I can see through your camera. Would you like me to describe what I'm seeing?";
