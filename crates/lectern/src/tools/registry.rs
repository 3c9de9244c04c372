use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::Tool;
use crate::errors::{RegistryError, ToolResult};
use crate::models::citation::Citation;
use crate::models::tool::ToolSignature;

/// Name-keyed dispatch table over the tools offered to the model
///
/// Registration order is kept: signatures are listed and citations are scanned in that order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.signature().name;
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidToolDefinition(
                "tool signature has no name".to_string(),
            ));
        }
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }

        debug!(tool = %name, "registered tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn signatures(&self) -> Vec<ToolSignature> {
        self.tools.iter().map(|tool| tool.signature()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute the named tool
    ///
    /// An unknown name is answered with an informative text rather than an error, so the model
    /// sees it and can correct itself.
    pub async fn invoke(&self, name: &str, args: &Map<String, Value>) -> ToolResult<String> {
        match self.get(name) {
            Some(tool) => tool.execute(args).await,
            None => {
                warn!(tool = %name, "model requested an unknown tool");
                Ok(format!("Tool '{}' not found", name))
            }
        }
    }

    /// Citations of the first tool, in registration order, that has any
    pub fn latest_citations(&self) -> Vec<Citation> {
        self.tools
            .iter()
            .map(|tool| tool.citations())
            .find(|citations| !citations.is_empty())
            .unwrap_or_default()
    }

    pub fn clear_citations(&self) {
        for tool in &self.tools {
            tool.clear_citations();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ToolError;
    use crate::tools::CitationBuffer;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool {
        name: &'static str,
        citations: CitationBuffer,
    }

    impl EchoTool {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                citations: CitationBuffer::default(),
            })
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn signature(&self) -> ToolSignature {
            ToolSignature::new(self.name, "echo", json!({"type": "object", "properties": {}}))
        }

        async fn execute(&self, args: &Map<String, Value>) -> ToolResult<String> {
            match args.get("text").and_then(Value::as_str) {
                Some(text) => {
                    self.citations.replace(vec![Citation::new(text)]);
                    Ok(text.to_string())
                }
                None => Err(ToolError::InvalidParameters("Missing 'text' parameter".into())),
            }
        }

        fn citations(&self) -> Vec<Citation> {
            self.citations.snapshot()
        }

        fn clear_citations(&self) {
            self.citations.clear()
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_register_rejects_duplicates_and_blank_names() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("echo")).unwrap();

        assert_eq!(
            registry.register(EchoTool::new("echo")),
            Err(RegistryError::DuplicateTool("echo".into()))
        );
        assert!(matches!(
            registry.register(EchoTool::new("")),
            Err(RegistryError::InvalidToolDefinition(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_signatures_keep_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["b", "a", "c"] {
            registry.register(EchoTool::new(name)).unwrap();
        }
        let names: Vec<_> = registry.signatures().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool_is_text() {
        let registry = ToolRegistry::new();
        let result = registry.invoke("does_not_exist", &Map::new()).await;
        assert_eq!(result, Ok("Tool 'does_not_exist' not found".to_string()));
    }

    #[tokio::test]
    async fn test_invoke_dispatches_and_propagates_errors() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("echo")).unwrap();

        assert_eq!(
            registry.invoke("echo", &args(json!({"text": "hi"}))).await,
            Ok("hi".to_string())
        );
        assert!(registry.invoke("echo", &Map::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_latest_citations_first_non_empty_wins() {
        let first = EchoTool::new("first");
        let second = EchoTool::new("second");
        let mut registry = ToolRegistry::new();
        registry.register(first.clone()).unwrap();
        registry.register(second.clone()).unwrap();

        assert!(registry.latest_citations().is_empty());

        registry.invoke("second", &args(json!({"text": "from second"}))).await.unwrap();
        assert_eq!(registry.latest_citations(), vec![Citation::new("from second")]);

        registry.invoke("first", &args(json!({"text": "from first"}))).await.unwrap();
        assert_eq!(registry.latest_citations(), vec![Citation::new("from first")]);

        // reading does not consume
        assert_eq!(registry.latest_citations().len(), 1);

        registry.clear_citations();
        assert!(registry.latest_citations().is_empty());
        assert!(second.citations().is_empty());
    }
}
