use anyhow::Result;
use lectern::credentials::{CredentialProvider, StaticToken, TokenManager};
use lectern::providers::azure::AzureOpenAiProvider;
use lectern::providers::configs::AzureOpenAiProviderConfig;
use lectern::rag::RagSystem;
use lectern::search::remote::{RemoteSearchConfig, RemoteSearchProvider};
use lectern::tools::ExpertQaTool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::configuration::Settings;
use crate::error::{to_env_var, ConfigError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub rag: Arc<RagSystem>,
}

impl AppState {
    pub fn new(rag: RagSystem) -> Self {
        Self { rag: Arc::new(rag) }
    }

    /// Build the completion provider, search client and tools described by `settings`
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        // One token manager serves both the completion endpoint and the nutrition API
        let token_manager: Option<Arc<dyn CredentialProvider>> =
            TokenManager::from_settings(settings.oauth.to_settings())
                .map(|manager| Arc::new(manager) as Arc<dyn CredentialProvider>);

        let completion_credentials: Arc<dyn CredentialProvider> =
            match settings.completion.api_key.as_deref() {
                Some(key) if !key.is_empty() => Arc::new(StaticToken::new(key)),
                _ => token_manager.clone().ok_or_else(|| ConfigError::MissingEnvVar {
                    env_var: to_env_var("completion.api_key"),
                })?,
            };

        let completion = &settings.completion;
        let mut provider_config = AzureOpenAiProviderConfig::new(
            completion.endpoint.clone(),
            completion.deployment.clone(),
            completion_credentials,
        );
        provider_config.api_version = completion.api_version.clone();
        provider_config.temperature = completion.temperature;
        provider_config.max_tokens = completion.max_tokens;
        provider_config.timeout = Duration::from_secs(completion.timeout_secs);
        let provider = AzureOpenAiProvider::new(provider_config)?;

        let search = RemoteSearchProvider::new(RemoteSearchConfig {
            base_url: settings.search.base_url.clone(),
            max_results: settings.search.max_results,
            timeout: Duration::from_secs(settings.search.timeout_secs),
        })?;

        if token_manager.is_none() {
            info!("nutrition expert has no credentials; its answers will report the missing auth");
        }
        let expert = ExpertQaTool::new(settings.expert.to_config(), token_manager)?;

        let rag = RagSystem::new(
            Arc::new(provider),
            Arc::new(search),
            expert,
            settings.assistant.options(),
        )?;
        Ok(Self::new(rag))
    }
}
