use async_trait::async_trait;
use gloo_net::http::Request;
use web_sys::{Blob, BlobPropertyBag, FormData};

use vision_core::ports::CaptionPort;
use vision_types::{Result, VisionError, caption::AnalyzeFrameResponse};

use crate::{js_error, network_error};

/// Multipart field and file name the analysis endpoint expects
const FRAME_FIELD: &str = "file";
const FRAME_FILE_NAME: &str = "frame.jpg";

/// Client of `POST /api/analyze-frame`.
pub struct HttpCaptionService {
    url: String,
}

impl HttpCaptionService {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    fn form_for(frame: &[u8], mime_type: &str) -> Result<FormData> {
        let bytes = js_sys::Uint8Array::from(frame);
        let parts = js_sys::Array::of1(&bytes);
        let options = BlobPropertyBag::new();
        options.set_type(mime_type);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(js_error)?;

        let form = FormData::new().map_err(js_error)?;
        form.append_with_blob_and_filename(FRAME_FIELD, &blob, FRAME_FILE_NAME)
            .map_err(js_error)?;
        Ok(form)
    }
}

#[async_trait(?Send)]
impl CaptionPort for HttpCaptionService {
    async fn analyze_frame(&self, frame: &[u8], mime_type: &str) -> Result<String> {
        let form = Self::form_for(frame, mime_type)?;
        let response = Request::post(&self.url)
            .body(form)
            .map_err(network_error)?
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        // Failures carry `{ error, details }` with a 5xx status
        let reply: AnalyzeFrameResponse = response
            .json()
            .await
            .map_err(|_| VisionError::Caption(format!("analysis failed: HTTP {}", status)))?;
        reply.into_result()
    }
}
