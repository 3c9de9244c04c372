use crate::error::{to_env_var, ConfigError, ENV_PREFIX};
use config::{Config, Environment, File};
use lectern::credentials::{OAuthSettings, DEFAULT_SCOPE};
use lectern::providers::configs::{DEFAULT_API_VERSION, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use lectern::rag::RagOptions;
use lectern::tools::{expert, ExpertQaConfig};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                env_var: to_env_var("server.host"),
                reason: e.to_string(),
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionSettings {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub deployment: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Static key; when absent the OAuth client credentials are used
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_scope")]
    pub scope: String,
}

impl OAuthConfig {
    pub fn to_settings(&self) -> OAuthSettings {
        OAuthSettings {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            token_url: self.token_url.clone(),
            scope: self.scope.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpertSettings {
    #[serde(default = "default_expert_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_document_base_url")]
    pub document_base_url: String,
    #[serde(default = "default_userid")]
    pub userid: String,
    #[serde(default = "default_datasource")]
    pub datasource: String,
    #[serde(default = "default_expert_model")]
    pub model: String,
    #[serde(default = "default_expert_timeout")]
    pub timeout_secs: u64,
}

impl ExpertSettings {
    pub fn to_config(&self) -> ExpertQaConfig {
        ExpertQaConfig {
            endpoint: self.endpoint.clone(),
            document_base_url: self.document_base_url.clone(),
            userid: self.userid.clone(),
            datasource: self.datasource.clone(),
            model: self.model.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantSettings {
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

impl AssistantSettings {
    pub fn options(&self) -> RagOptions {
        RagOptions {
            max_tool_rounds: self.max_tool_rounds,
            max_history: self.max_history,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub completion: CompletionSettings,
    pub oauth: OAuthConfig,
    pub search: SearchSettings,
    pub expert: ExpertSettings,
    pub assistant: AssistantSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Self::load()?;
        settings.validate()?;
        Ok(settings)
    }

    fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("completion.api_version", default_api_version())?
            .set_default("completion.max_tokens", default_max_tokens())?
            .set_default("completion.timeout_secs", default_completion_timeout())?
            .set_default("oauth.token_url", default_token_url())?
            .set_default("oauth.scope", default_scope())?
            .set_default("search.max_results", default_max_results() as u64)?
            .set_default("search.timeout_secs", default_search_timeout())?
            .set_default("expert.endpoint", default_expert_endpoint())?
            .set_default("expert.timeout_secs", default_expert_timeout())?
            .set_default("assistant.max_history", default_max_history() as u64)?
            .set_default("assistant.max_tool_rounds", default_max_tool_rounds() as u64)?
            // Optional lectern.toml in the working directory, then the environment on top
            .add_source(File::with_name("lectern").required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }

    /// Reject settings the service cannot start with, naming the variable to set
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("completion.endpoint", &self.completion.endpoint),
            ("completion.deployment", &self.completion.deployment),
            ("search.base_url", &self.search.base_url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingEnvVar {
                    env_var: to_env_var(field),
                });
            }
        }

        let has_api_key = self
            .completion
            .api_key
            .as_deref()
            .is_some_and(|key| !key.is_empty());
        if !has_api_key && !self.oauth.to_settings().is_configured() {
            return Err(ConfigError::MissingEnvVar {
                env_var: to_env_var("completion.api_key"),
            });
        }

        if self.assistant.max_history == 0 {
            return Err(ConfigError::InvalidValue {
                env_var: to_env_var("assistant.max_history"),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_completion_timeout() -> u64 {
    60
}

fn default_token_url() -> String {
    "https://uc-sf.okta.com/oauth2/ausnwf6tyaq6v47QF5d7/v1/token".to_string()
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

fn default_max_results() -> usize {
    lectern::search::remote::DEFAULT_MAX_RESULTS
}

fn default_search_timeout() -> u64 {
    15
}

fn default_expert_endpoint() -> String {
    expert::DEFAULT_ENDPOINT.to_string()
}

fn default_document_base_url() -> String {
    expert::DEFAULT_DOCUMENT_BASE_URL.to_string()
}

fn default_userid() -> String {
    ExpertQaConfig::default().userid
}

fn default_datasource() -> String {
    ExpertQaConfig::default().datasource
}

fn default_expert_model() -> String {
    ExpertQaConfig::default().model
}

fn default_expert_timeout() -> u64 {
    expert::DEFAULT_TIMEOUT.as_secs()
}

fn default_max_history() -> usize {
    lectern::session::DEFAULT_MAX_HISTORY
}

fn default_max_tool_rounds() -> usize {
    lectern::orchestrator::DEFAULT_MAX_TOOL_ROUNDS
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("LECTERN_") {
                env::remove_var(&key);
            }
        }
    }

    fn set_required() {
        env::set_var("LECTERN_COMPLETION__ENDPOINT", "https://example.openai.azure.com/openai/deployments/gpt-4o");
        env::set_var("LECTERN_COMPLETION__DEPLOYMENT", "gpt-4o");
        env::set_var("LECTERN_COMPLETION__API_KEY", "test-key");
        env::set_var("LECTERN_SEARCH__BASE_URL", "http://localhost:9000");
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();
        set_required();

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.completion.api_version, "2024-02-01");
        assert_eq!(settings.completion.api_key.as_deref(), Some("test-key"));
        assert_eq!(settings.completion.max_tokens, 800);
        assert_eq!(settings.completion.temperature, 0.0);
        assert_eq!(settings.search.max_results, 5);
        assert_eq!(settings.search.timeout_secs, 15);
        assert_eq!(settings.expert.timeout_secs, 30);
        assert_eq!(settings.expert.datasource, "eureka_fim");
        assert_eq!(settings.oauth.scope, "versa.web versa.chat versa.assistant");
        assert_eq!(settings.assistant.max_history, 2);
        assert_eq!(settings.assistant.max_tool_rounds, 2);

        clean_env();
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        set_required();
        env::set_var("LECTERN_SERVER__PORT", "8080");
        env::set_var("LECTERN_SEARCH__MAX_RESULTS", "8");
        env::set_var("LECTERN_ASSISTANT__MAX_TOOL_ROUNDS", "3");
        env::set_var("LECTERN_EXPERT__USERID", "jane.doe@example.edu");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.search.max_results, 8);
        assert_eq!(settings.assistant.options().max_tool_rounds, 3);
        assert_eq!(settings.expert.to_config().userid, "jane.doe@example.edu");

        clean_env();
    }

    #[test]
    #[serial]
    fn test_missing_endpoint_names_variable() {
        clean_env();
        set_required();
        env::remove_var("LECTERN_COMPLETION__ENDPOINT");

        match Settings::new() {
            Err(ConfigError::MissingEnvVar { env_var }) => {
                assert_eq!(env_var, "LECTERN_COMPLETION__ENDPOINT")
            }
            other => panic!("Expected MissingEnvVar, got {:?}", other),
        }

        clean_env();
    }

    #[test]
    #[serial]
    fn test_credentials_required() {
        clean_env();
        set_required();
        env::remove_var("LECTERN_COMPLETION__API_KEY");

        match Settings::new() {
            Err(ConfigError::MissingEnvVar { env_var }) => {
                assert_eq!(env_var, "LECTERN_COMPLETION__API_KEY")
            }
            other => panic!("Expected MissingEnvVar, got {:?}", other),
        }

        env::set_var("LECTERN_OAUTH__CLIENT_ID", "client");
        env::set_var("LECTERN_OAUTH__CLIENT_SECRET", "secret");
        let settings = Settings::new().unwrap();
        assert!(settings.completion.api_key.is_none());
        assert!(settings.oauth.to_settings().is_configured());

        clean_env();
    }

    #[test]
    fn test_socket_addr_conversion() {
        let server_settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        let addr = server_settings.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");

        let bad = ServerSettings {
            host: "not a host".to_string(),
            port: 3000,
        };
        assert!(matches!(bad.socket_addr(), Err(ConfigError::InvalidValue { .. })));
    }
}
