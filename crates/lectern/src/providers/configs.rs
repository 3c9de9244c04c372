use std::sync::Arc;
use std::time::Duration;

use crate::credentials::CredentialProvider;

pub const DEFAULT_API_VERSION: &str = "2024-02-01";
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_MAX_TOKENS: u32 = 800;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection and sampling settings for an Azure-hosted chat-completions deployment
#[derive(Clone)]
pub struct AzureOpenAiProviderConfig {
    /// Base URL; requests go to `<endpoint>/chat/completions`
    pub endpoint: String,
    /// Deployment name, sent as the `model` field
    pub deployment: String,
    pub api_version: String,
    /// Yields the bearer credential for each request
    pub credentials: Arc<dyn CredentialProvider>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl AzureOpenAiProviderConfig {
    pub fn new<E, D>(endpoint: E, deployment: D, credentials: Arc<dyn CredentialProvider>) -> Self
    where
        E: Into<String>,
        D: Into<String>,
    {
        Self {
            endpoint: endpoint.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            credentials,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
