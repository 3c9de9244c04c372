use thiserror::Error;

/// Failures raised by a tool while executing a call.
///
/// The orchestrator turns these into `tool` messages, so none of them escape a
/// generation run.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("{0}")]
    ExecutionError(String),
}

pub type ToolResult<T> = Result<T, ToolError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Invalid tool definition: {0}")]
    InvalidToolDefinition(String),
}

/// The completion endpoint could not be reached or answered with something unusable.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Completion request failed: {0:#}")]
    Completion(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum RagError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to render system prompt: {0}")]
    Prompt(#[from] tera::Error),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Search service failed: {0:#}")]
    Search(#[from] anyhow::Error),
}
