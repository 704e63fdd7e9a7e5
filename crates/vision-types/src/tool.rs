use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Advertised schema of a locally dispatchable function.
/// Sent in `session.update` so the remote model may call it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    #[serde(rename = "type")]
    pub kind: String, // always "function"
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
}

impl ToolDescriptor {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
    ) -> Self {
        Self {
            kind: "function".to_string(),
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub schema_type: String, // always "object"
    pub properties: serde_json::Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub required: Vec<String>,
}

impl ToolParameters {
    pub fn object(properties: serde_json::Map<String, Value>, required: Vec<String>) -> Self {
        Self {
            schema_type: "object".to_string(),
            properties,
            required,
        }
    }
}
