//! Function dispatch table and built-in functions.
//!
//! Each entry pairs a handler with the tool descriptor advertised in
//! `session.update`; the remote model can only call what is advertised.

use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use vision_types::{
    Result, VisionError,
    event::LogSummary,
    message::OutboundMessage,
    tool::{ToolDescriptor, ToolParameters},
};

use crate::dispatcher::Dispatcher;

pub const GET_LOGS: &str = "getLogs";
pub const UPDATE_SYSTEM_PROMPT: &str = "updateSystemPrompt";

/// A locally executable function the model may invoke.
#[async_trait(?Send)]
pub trait RealtimeFunction {
    fn descriptor(&self) -> ToolDescriptor;

    /// Run with parsed arguments; the result is serialized into the output item.
    async fn invoke(&self, args: Value, dispatcher: &Dispatcher) -> Result<Value>;
}

/// Registry of available functions
pub struct FunctionTable {
    functions: HashMap<String, Rc<dyn RealtimeFunction>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        let mut table = Self::empty();
        table.register_builtins();
        table
    }

    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn register(&mut self, function: Rc<dyn RealtimeFunction>) {
        let name = function.descriptor().name;
        self.functions.insert(name, function);
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn RealtimeFunction>> {
        self.functions.get(name).cloned()
    }

    /// Descriptors sorted by name, for a stable `session.update`
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<ToolDescriptor> =
            self.functions.values().map(|f| f.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    fn register_builtins(&mut self) {
        self.register(Rc::new(GetLogs));
        self.register(Rc::new(UpdateSystemPrompt));
    }
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a JSON arguments string. An empty string means no arguments.
pub fn parse_function_args(args: &str) -> std::result::Result<Value, serde_json::Error> {
    if args.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(args)
}

fn typed_args<T: DeserializeOwned>(name: &str, args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| VisionError::Function {
        name: name.to_string(),
        message: format!("invalid arguments: {}", e),
    })
}

// ─── getLogs ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GetLogsArgs {
    #[serde(default = "default_log_count")]
    count: usize,
}

fn default_log_count() -> usize {
    5
}

pub struct GetLogs;

#[async_trait(?Send)]
impl RealtimeFunction for GetLogs {
    fn descriptor(&self) -> ToolDescriptor {
        let mut props = Map::new();
        props.insert("count".to_string(), json!({
            "type": "integer",
            "description": "Number of recent events to return (default 5)"
        }));

        ToolDescriptor::function(
            GET_LOGS,
            "Get the most recent events of this session, newest first",
            ToolParameters::object(props, vec![]),
        )
    }

    async fn invoke(&self, args: Value, dispatcher: &Dispatcher) -> Result<Value> {
        let args: GetLogsArgs = typed_args(GET_LOGS, args)?;
        let logs: Vec<LogSummary> = dispatcher
            .session()
            .recent_events(args.count)
            .iter()
            .map(|entry| entry.summary())
            .collect();
        Ok(serde_json::to_value(logs)?)
    }
}

// ─── updateSystemPrompt ──────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UpdateSystemPromptArgs {
    context: String,
}

#[derive(Debug, Serialize)]
struct UpdateSystemPromptResult {
    success: bool,
    context: String,
}

pub struct UpdateSystemPrompt;

#[async_trait(?Send)]
impl RealtimeFunction for UpdateSystemPrompt {
    fn descriptor(&self) -> ToolDescriptor {
        let mut props = Map::new();
        props.insert("context".to_string(), json!({
            "type": "string",
            "description": "New context to add to the conversation as a system message"
        }));

        ToolDescriptor::function(
            UPDATE_SYSTEM_PROMPT,
            "Add context to the conversation as a system message",
            ToolParameters::object(props, vec!["context".to_string()]),
        )
    }

    async fn invoke(&self, args: Value, dispatcher: &Dispatcher) -> Result<Value> {
        let args: UpdateSystemPromptArgs = typed_args(UPDATE_SYSTEM_PROMPT, args)?;
        dispatcher.send(OutboundMessage::system_text(args.context.clone()))?;
        Ok(serde_json::to_value(UpdateSystemPromptResult {
            success: true,
            context: args.context,
        })?)
    }
}
