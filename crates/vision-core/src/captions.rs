use std::rc::Rc;

use vision_types::{Result, caption::CaptionLogEntry};

use crate::ports::CaptionPort;
use crate::reducer::{Reducer, Reduction};

/// Bridges the frame-analysis service into the event stream.
///
/// Each caption becomes a `log.update` event handed to the reducer, exactly
/// like an inbound message, so it can refresh the scene context.
pub struct CaptionFeed {
    port: Rc<dyn CaptionPort>,
    reducer: Rc<Reducer>,
}

impl CaptionFeed {
    pub fn new(port: Rc<dyn CaptionPort>, reducer: Rc<Reducer>) -> Self {
        Self { port, reducer }
    }

    pub async fn submit_frame(&self, frame: &[u8], mime_type: &str) -> Result<(CaptionLogEntry, Reduction)> {
        let caption = self.port.analyze_frame(frame, mime_type).await?;
        log::debug!("Caption received ({} bytes of {})", frame.len(), mime_type);
        let entry = CaptionLogEntry::new(caption, frame.len() as u64, mime_type);
        let reduction = self.reducer.ingest_caption(entry.clone()).await;
        Ok((entry, reduction))
    }
}
