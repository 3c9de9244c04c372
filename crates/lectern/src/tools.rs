use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::{Mutex, MutexGuard};

use crate::errors::{ToolError, ToolResult};
use crate::models::citation::Citation;
use crate::models::tool::ToolSignature;

pub mod expert;
pub mod outline;
pub mod registry;
pub mod search;

pub use expert::{ExpertQaConfig, ExpertQaTool};
pub use outline::OutlineTool;
pub use registry::ToolRegistry;
pub use search::SearchTool;

/// A capability the model can invoke by name
#[async_trait]
pub trait Tool: Send + Sync {
    /// The signature offered to the model; its name is the registry key
    fn signature(&self) -> ToolSignature;

    /// Run the tool with already-parsed arguments
    ///
    /// `Ok` text is shown to the model as-is, including informative "nothing found" texts.
    /// `Err` marks the call as failed.
    async fn execute(&self, args: &Map<String, Value>) -> ToolResult<String>;

    /// Citations left behind by the latest successful execution
    fn citations(&self) -> Vec<Citation> {
        Vec::new()
    }

    fn clear_citations(&self) {}
}

/// Per-tool citation storage, replaced wholesale by each execution
#[derive(Debug, Default)]
pub struct CitationBuffer(Mutex<Vec<Citation>>);

impl CitationBuffer {
    fn lock(&self) -> MutexGuard<'_, Vec<Citation>> {
        // a panic while holding the lock cannot leave a half-written list behind
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn replace(&self, citations: Vec<Citation>) {
        *self.lock() = citations;
    }

    pub fn snapshot(&self) -> Vec<Citation> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

pub(crate) fn required_str<'a>(args: &'a Map<String, Value>, name: &str) -> ToolResult<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidParameters(format!("Missing '{}' parameter", name)))
}

/// A string argument, treating null and empty strings as absent
pub(crate) fn optional_str<'a>(
    args: &'a Map<String, Value>,
    name: &str,
) -> ToolResult<Option<&'a str>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ToolError::InvalidParameters(format!(
            "'{}' must be a string, got {}",
            name, other
        ))),
    }
}

/// A non-negative integer argument; models occasionally send numbers as strings
pub(crate) fn optional_u32(args: &Map<String, Value>, name: &str) -> ToolResult<Option<u32>> {
    let invalid = |value: &Value| {
        ToolError::InvalidParameters(format!(
            "'{}' must be a non-negative integer, got {}",
            name, value
        ))
    };

    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| invalid(value)),
        Some(value @ Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid(value)),
        Some(value) => Err(invalid(value)),
    }
}
