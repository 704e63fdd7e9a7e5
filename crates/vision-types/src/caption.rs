use serde::{Deserialize, Deserializer, Serialize};

/// One caption produced by the frame-analysis service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionLogEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub caption: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_size: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mime_type: String,
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl CaptionLogEntry {
    pub fn new(caption: impl Into<String>, image_size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            timestamp: crate::clock::rfc3339_now(),
            caption: caption.into(),
            image_size,
            mime_type: mime_type.into(),
        }
    }
}

/// Response of `POST /api/analyze-frame`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnalyzeFrameResponse {
    Caption { caption: String },
    Failure {
        error: String,
        #[serde(default)]
        details: Option<String>,
    },
}

impl AnalyzeFrameResponse {
    pub fn into_result(self) -> crate::Result<String> {
        match self {
            AnalyzeFrameResponse::Caption { caption } => Ok(caption),
            AnalyzeFrameResponse::Failure { error, details } => Err(crate::VisionError::Caption(
                match details {
                    Some(details) => format!("{}: {}", error, details),
                    None => error,
                },
            )),
        }
    }
}
