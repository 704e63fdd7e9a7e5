//! Context synthesizer: turns the two latest captions into a system message.

use vision_types::{
    Result,
    event::LogEntry,
    message::OutboundMessage,
};

use crate::dispatcher::{Dispatcher, Disposition};

/// Captions folded into each context update
const CAPTION_WINDOW: usize = 2;

#[derive(Debug, Default, Clone, Copy)]
pub struct ContextSynthesizer;

impl ContextSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Build the context message from a most-recent-first log.
    /// Returns `None` while fewer than two captions are known.
    pub fn compose<'a>(&self, log: impl IntoIterator<Item = &'a LogEntry>) -> Option<OutboundMessage> {
        let mut captions: Vec<&str> = log
            .into_iter()
            .filter_map(LogEntry::caption)
            .take(CAPTION_WINDOW)
            .collect();
        if captions.len() < CAPTION_WINDOW {
            return None;
        }
        // oldest of the pair first
        captions.reverse();
        let scene = captions
            .into_iter()
            .map(strip_emphasis)
            .collect::<Vec<_>>()
            .join("\n\n");
        Some(OutboundMessage::system_text(scene_prompt(&scene)))
    }

    /// Compose from the session log and dispatch, if there is enough to say.
    pub fn synthesize(&self, dispatcher: &Dispatcher) -> Result<Option<Disposition>> {
        let message = dispatcher.session().with(|s| self.compose(s.log.entries()));
        match message {
            Some(message) => {
                log::debug!("Dispatching scene context update");
                dispatcher.send(message).map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Remove markdown emphasis (`**` and `*`)
pub fn strip_emphasis(caption: &str) -> String {
    caption.replace("**", "").replace('*', "")
}

fn scene_prompt(scene: &str) -> String {
    format!(
        "You are a helpful AI assistant that gives conversational descriptions of what you see in images. \
         Based on the latest image captions, you are currently seeing:\n\n\
         {scene}\n\n\
         Your role is to:\n\
         - Describe what you see in a natural, conversational way\n\
         - Update your understanding of the scene based on new captions\n\
         - Engage in dialogue about the scene and its context\n\
         - Notice changes in the environment or the person's state\n\n\
         Keep a friendly and engaging tone while describing the scene."
    )
}
