//! Bearer credentials for the completion endpoint and the expert Q&A API
//!
//! Callers only ever see [`CredentialProvider::get_token`]. How the token is obtained and when
//! it is refreshed stays behind the trait.
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const DEFAULT_SCOPE: &str = "versa.web versa.chat versa.assistant";
const REFRESH_BUFFER_SECS: i64 = 300;
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("OAuth client credentials are incomplete: client_id and client_secret are required")]
    MissingClientCredentials,

    #[error("OAuth token request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OAuth token endpoint returned {0}")]
    Status(reqwest::StatusCode),

    #[error("OAuth response missing 'access_token' field")]
    MissingAccessToken,
}

/// Supplies a bearer token for outbound requests
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_token(&self) -> Result<String, CredentialError>;
}

/// A fixed token, e.g. an API key
pub struct StaticToken(String);

impl StaticToken {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn get_token(&self) -> Result<String, CredentialError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub scope: String,
}

impl OAuthSettings {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct TokenData {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl TokenData {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - ChronoDuration::seconds(REFRESH_BUFFER_SECS)
    }
}

/// When a token issued at `now` expires; lifetimes that are missing, non-positive or out of
/// range fall back to the default
fn expiry_from(now: DateTime<Utc>, expires_in: Option<i64>) -> DateTime<Utc> {
    let default = ChronoDuration::seconds(DEFAULT_EXPIRES_IN_SECS);
    let lifetime = expires_in
        .filter(|secs| *secs > 0)
        .and_then(ChronoDuration::try_seconds)
        .unwrap_or(default);
    now.checked_add_signed(lifetime)
        .unwrap_or_else(|| now + default)
}

/// OAuth2 client-credentials token source with an in-memory cache
///
/// The cache lives behind an async mutex held across the refresh, so concurrent callers wait
/// for a single token request instead of each issuing their own.
pub struct TokenManager {
    client: Client,
    settings: OAuthSettings,
    cached: Mutex<Option<TokenData>>,
}

impl TokenManager {
    pub fn new(settings: OAuthSettings) -> Result<Self, CredentialError> {
        if !settings.is_configured() {
            return Err(CredentialError::MissingClientCredentials);
        }
        let client = Client::builder().timeout(TOKEN_REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            settings,
            cached: Mutex::new(None),
        })
    }

    /// Build a manager when client credentials are present, `None` otherwise
    pub fn from_settings(settings: OAuthSettings) -> Option<Self> {
        if !settings.is_configured() {
            debug!("OAuth client credentials not configured");
            return None;
        }
        Self::new(settings).ok()
    }

    /// Drop the cached token so the next call fetches a new one
    pub async fn clear_cache(&self) {
        *self.cached.lock().await = None;
        debug!("token cache cleared");
    }

    async fn fetch(&self) -> Result<TokenData, CredentialError> {
        let scope = if self.settings.scope.is_empty() {
            DEFAULT_SCOPE
        } else {
            self.settings.scope.as_str()
        };
        let form = [
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", scope),
        ];

        let response = self
            .client
            .post(&self.settings.token_url)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CredentialError::Status(response.status()));
        }

        let body: TokenResponse = response.json().await?;
        let access_token = body
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(CredentialError::MissingAccessToken)?;
        let expires_at = expiry_from(Utc::now(), body.expires_in);

        info!(%expires_at, "fetched new OAuth token");
        Ok(TokenData {
            access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl CredentialProvider for TokenManager {
    async fn get_token(&self) -> Result<String, CredentialError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.needs_refresh(Utc::now()) {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.fetch().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }
}
