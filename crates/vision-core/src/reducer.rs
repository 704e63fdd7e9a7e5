//! Inbound event reducer.
//!
//! Every inbound message is stamped and prepended to the event log first;
//! side effects are then decided from the message type:
//! 1. function call → run the handler, send its output, then request a response
//! 2. caption update → refresh the scene context from the latest captions,
//!    unless no session is running
//! 3. response done → diagnostics only
//!
//! A known type with an unusable body is still logged; only its side effect
//! is skipped.

use std::rc::Rc;

use serde_json::json;
use vision_types::{
    VisionError,
    caption::CaptionLogEntry,
    event::{LogEntry, SessionNotice},
    message::{FunctionCallRecord, InboundMessage, OutboundMessage, ServerEvent},
};

use crate::context::ContextSynthesizer;
use crate::dispatcher::Dispatcher;
use crate::functions::{FunctionTable, parse_function_args};

/// What a single inbound message caused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reduction {
    Logged,
    Malformed,
    FunctionDispatched { name: String, call_id: String },
    FunctionIgnored { name: String },
    StaleOutputDropped { name: String },
    ContextDispatched,
}

pub struct Reducer {
    dispatcher: Dispatcher,
    functions: Rc<FunctionTable>,
    synthesizer: ContextSynthesizer,
}

impl Reducer {
    pub fn new(dispatcher: Dispatcher, functions: Rc<FunctionTable>) -> Self {
        Self {
            dispatcher,
            functions,
            synthesizer: ContextSynthesizer::new(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Reduce a raw channel payload. Payloads that are not typed JSON objects are dropped.
    pub async fn reduce(&self, payload: &str) -> Reduction {
        match InboundMessage::parse(payload) {
            Ok(message) => self.apply(message).await,
            Err(e) => {
                log::warn!("Dropping malformed inbound message: {}", e);
                self.dispatcher.session().notify(SessionNotice::MalformedMessage {
                    message: e.to_string(),
                });
                Reduction::Malformed
            }
        }
    }

    /// Surface a caption as a `log.update` event.
    pub async fn ingest_caption(&self, entry: CaptionLogEntry) -> Reduction {
        self.apply(InboundMessage::log_update(entry)).await
    }

    pub async fn apply(&self, message: InboundMessage) -> Reduction {
        let session = self.dispatcher.session();
        let generation = session.generation();
        let event = message.event.clone();
        log::debug!("Received {}", message.kind);
        session.with_mut(|s| s.log.prepend(LogEntry::Received(message)));

        match event {
            ServerEvent::FunctionCallArgumentsDone(call) => {
                self.dispatch_function(call, generation).await
            }
            ServerEvent::LogUpdate(_) if session.status().is_dormant() => {
                log::debug!("No session; skipping scene context update");
                Reduction::Logged
            }
            ServerEvent::LogUpdate(_) => match self.synthesizer.synthesize(&self.dispatcher) {
                Ok(Some(_)) => Reduction::ContextDispatched,
                Ok(None) => Reduction::Logged,
                Err(e) => {
                    log::error!("Failed to dispatch scene context: {}", e);
                    Reduction::Logged
                }
            },
            ServerEvent::ResponseDone(summary) => {
                log::debug!("Response completed with {} output items", summary.output.len());
                session.notify(SessionNotice::ResponseCompleted {
                    output_items: summary.output.len(),
                });
                Reduction::Logged
            }
            ServerEvent::Error(error) => {
                log::warn!("Realtime API error: {}", error.message);
                session.notify(SessionNotice::RemoteError {
                    message: error.message,
                });
                Reduction::Logged
            }
            ServerEvent::Undecoded(reason) => {
                log::warn!("Ignoring undecodable {}", reason);
                session.notify(SessionNotice::MalformedMessage { message: reason });
                Reduction::Logged
            }
            ServerEvent::Other => Reduction::Logged,
        }
    }

    async fn dispatch_function(&self, call: FunctionCallRecord, generation: u64) -> Reduction {
        let Some(function) = self.functions.get(&call.name) else {
            log::debug!("Ignoring call to unregistered function {}", call.name);
            return Reduction::FunctionIgnored { name: call.name };
        };

        log::info!("Invoking {} ({})", call.name, call.call_id);
        let result = match parse_function_args(&call.arguments) {
            Ok(args) => function.invoke(args, &self.dispatcher).await,
            Err(e) => Err(VisionError::Function {
                name: call.name.clone(),
                message: format!("Failed to parse arguments: {}", e),
            }),
        };

        let session = self.dispatcher.session();
        if !session.is_current(generation) {
            log::warn!("Session changed while {} ran; dropping its output", call.name);
            session.notify(SessionNotice::StaleOutputDropped {
                name: call.name.clone(),
                call_id: call.call_id,
            });
            return Reduction::StaleOutputDropped { name: call.name };
        }

        let output = match result {
            Ok(value) => value.to_string(),
            Err(e) => {
                log::warn!("Function {} failed: {}", call.name, e);
                session.notify(SessionNotice::FunctionFailed {
                    name: call.name.clone(),
                    message: e.to_string(),
                });
                json!({ "error": e.to_string() }).to_string()
            }
        };

        if let Err(e) = self
            .dispatcher
            .send(OutboundMessage::function_output(call.call_id.clone(), output))
        {
            log::error!("Failed to send output of {}: {}", call.name, e);
            return Reduction::Logged;
        }
        if let Err(e) = self.dispatcher.send(OutboundMessage::response_create()) {
            log::error!("Failed to request a response after {}: {}", call.name, e);
        }

        Reduction::FunctionDispatched {
            name: call.name,
            call_id: call.call_id,
        }
    }
}
