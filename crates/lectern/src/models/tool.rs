use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The machine-readable description of a tool that is offered to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSignature {
    /// The name of the tool, unique within a registry
    pub name: String,
    /// A description the model uses to decide when the tool is relevant
    pub description: String,
    /// JSON schema of the accepted arguments
    pub parameters: Value,
}

impl ToolSignature {
    pub fn new<N, D>(name: N, description: D, parameters: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        ToolSignature {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A request from the model to run a tool, as it appeared in the completion reply
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocationRequest {
    /// Correlates the eventual tool result message with this request
    pub id: String,
    /// The name of the tool to execute
    pub name: String,
    /// Raw argument payload, kept unparsed so it can be echoed back verbatim
    pub arguments: String,
}

impl ToolInvocationRequest {
    pub fn new<I, N, A>(id: I, name: N, arguments: A) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the payload as a JSON object of named arguments
    pub fn parse_arguments(&self) -> serde_json::Result<Map<String, Value>> {
        serde_json::from_str(&self.arguments)
    }
}
