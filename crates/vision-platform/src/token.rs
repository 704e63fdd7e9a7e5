use async_trait::async_trait;
use gloo_net::http::Request;
use serde::Deserialize;

use vision_core::ports::TokenPort;
use vision_types::{Result, VisionError};

use crate::network_error;

/// `GET /token` response: `{ "client_secret": { "value": "..." } }`
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub client_secret: ClientSecret,
}

#[derive(Debug, Deserialize)]
pub struct ClientSecret {
    pub value: String,
}

/// Fetches the ephemeral credential from the application server.
pub struct HttpTokenSource {
    url: String,
}

impl HttpTokenSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait(?Send)]
impl TokenPort for HttpTokenSource {
    async fn fetch_token(&self) -> Result<String> {
        let response = Request::get(&self.url)
            .send()
            .await
            .map_err(network_error)?;

        if !response.ok() {
            return Err(VisionError::Network(format!(
                "Token request failed: HTTP {}",
                response.status()
            )));
        }

        let data: TokenResponse = response
            .json()
            .await
            .map_err(|e| VisionError::Serialization(e.to_string()))?;
        log::debug!("Ephemeral token acquired");
        Ok(data.client_secret.value)
    }
}
