use async_trait::async_trait;
use gloo_net::http::Request;

use vision_core::ports::SignalingPort;
use vision_types::{Result, VisionError};

use crate::network_error;

/// Posts the SDP offer to the realtime endpoint; the body of the reply is the answer.
pub struct HttpSignaling {
    url: String,
}

impl HttpSignaling {
    /// `url` already carries the model query, see `RealtimeConfig::signaling_url`
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait(?Send)]
impl SignalingPort for HttpSignaling {
    async fn exchange(&self, offer_sdp: &str, token: &str) -> Result<String> {
        let response = Request::post(&self.url)
            .header("Authorization", &format!("Bearer {}", token))
            .header("Content-Type", "application/sdp")
            .body(offer_sdp.to_string())
            .map_err(network_error)?
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;
        if !response.ok() {
            return Err(VisionError::Network(format!("HTTP {}: {}", status, body)));
        }
        if body.trim().is_empty() {
            return Err(VisionError::Transport("empty SDP answer".to_string()));
        }
        Ok(body)
    }
}
