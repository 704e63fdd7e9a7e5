use gloo_net::http::Request;
use serde::de::DeserializeOwned;

use vision_types::{
    Result, VisionError,
    session::{GeminiSetting, LogDeletionSetting},
};

use crate::network_error;

/// Reads and toggles the server-owned analysis flags.
///
/// Both flags live on the server; the client only observes the value returned
/// by each call.
pub struct SettingsClient {
    base: String,
}

impl SettingsClient {
    /// `base` is the API prefix, e.g. `/api`
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn gemini_setting(&self) -> Result<GeminiSetting> {
        self.get("gemini-setting").await
    }

    pub async fn toggle_gemini(&self) -> Result<GeminiSetting> {
        let setting: GeminiSetting = self.post("toggle-gemini").await?;
        log::info!("Frame analysis enabled: {}", setting.is_gemini_enabled);
        Ok(setting)
    }

    pub async fn log_deletion_setting(&self) -> Result<LogDeletionSetting> {
        self.get("log-deletion-setting").await
    }

    pub async fn toggle_log_deletion(&self) -> Result<LogDeletionSetting> {
        let setting: LogDeletionSetting = self.post("toggle-log-deletion").await?;
        log::info!("Delete logs on shutdown: {}", setting.should_delete_logs);
        Ok(setting)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = Request::get(&self.url(path))
            .send()
            .await
            .map_err(network_error)?;
        Self::decode(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = Request::post(&self.url(path))
            .send()
            .await
            .map_err(network_error)?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: gloo_net::http::Response) -> Result<T> {
        if !response.ok() {
            return Err(VisionError::Network(format!("HTTP {}", response.status())));
        }
        response
            .json()
            .await
            .map_err(|e| VisionError::Serialization(e.to_string()))
    }
}
