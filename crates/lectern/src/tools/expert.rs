use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::{required_str, CitationBuffer, Tool};
use crate::credentials::CredentialProvider;
use crate::errors::ToolResult;
use crate::models::citation::Citation;
use crate::models::tool::ToolSignature;

pub const EXPERT_TOOL_NAME: &str = "ask_nutrition_expert";
pub const DEFAULT_ENDPOINT: &str =
    "https://dev-unified-api.ucsf.edu/general/versaassistant/api/answer";
pub const DEFAULT_DOCUMENT_BASE_URL: &str = "https://dev-unified-api.ucsf.edu";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_FRAMING: &str = "You are a helpful assistant expert on nutrition, respond briefly";
const ANSWER_FIELDS: [&str; 4] = ["answer", "response", "content", "message"];

lazy_static! {
    static ref CITED_SOURCES: Regex = Regex::new(r"(?i)cited sources:").unwrap();
    static ref ANCHOR: Regex =
        Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*"([^"]*)"[^>]*>(.*?)</a>"#).unwrap();
}

/// Why a question could not be answered
///
/// The display texts are what the model sees in place of an answer; each one is distinct so
/// callers can tell the failure modes apart.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpertQaError {
    #[error("Error: Authentication not configured for nutrition queries.")]
    NotConfigured,

    #[error("Error: Could not obtain credentials for nutrition API - {0}")]
    Credential(String),

    #[error("Error: Nutrition API request timed out. Please try again.")]
    Timeout,

    #[error("Error: Failed to connect to nutrition API - {0}")]
    Transport(String),

    #[error("Error: Nutrition API returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Error: Invalid response format from nutrition API.")]
    MalformedJson,

    #[error("Error: Unrecognized response from nutrition API.")]
    UnrecognizedShape,
}

#[derive(Debug, Clone)]
pub struct ExpertQaConfig {
    pub endpoint: String,
    /// Relative document links in cited sources are resolved against this
    pub document_base_url: String,
    pub userid: String,
    pub datasource: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ExpertQaConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            document_base_url: DEFAULT_DOCUMENT_BASE_URL.to_string(),
            userid: "lectern".to_string(),
            datasource: "eureka_fim".to_string(),
            model: "GPT-4o".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Forwards nutrition questions to the remote expert Q&A service
pub struct ExpertQaTool {
    client: Client,
    config: ExpertQaConfig,
    credentials: Option<Arc<dyn CredentialProvider>>,
    citations: CitationBuffer,
}

impl ExpertQaTool {
    pub fn new(
        config: ExpertQaConfig,
        credentials: Option<Arc<dyn CredentialProvider>>,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config,
            credentials,
            citations: CitationBuffer::default(),
        })
    }

    /// Ask one question; on success the citation buffer holds the answer's cited sources
    pub async fn ask(&self, question: &str) -> Result<String, ExpertQaError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ExpertQaError::NotConfigured)?;
        let token = credentials
            .get_token()
            .await
            .map_err(|e| ExpertQaError::Credential(e.to_string()))?;

        let body = json!({
            "userid": self.config.userid,
            "datasource": self.config.datasource,
            "model": self.config.model,
            "temperature": "0.0",
            "context": "1",
            "returndoc": "1",
            "messages": [
                {"role": "system", "content": SYSTEM_FRAMING},
                {"role": "user", "content": question}
            ]
        });

        debug!(endpoint = %self.config.endpoint, "asking nutrition expert");
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExpertQaError::HttpStatus(status.as_u16()));
        }

        let text = response.text().await.map_err(classify_transport)?;
        let data: Value =
            serde_json::from_str(&text).map_err(|_| ExpertQaError::MalformedJson)?;
        let answer = extract_answer(&data).ok_or(ExpertQaError::UnrecognizedShape)?;

        let (answer, citations) = split_cited_sources(&answer, &self.config.document_base_url);
        self.citations.replace(citations);
        Ok(answer)
    }
}

fn classify_transport(error: reqwest::Error) -> ExpertQaError {
    if error.is_timeout() {
        ExpertQaError::Timeout
    } else {
        ExpertQaError::Transport(error.to_string())
    }
}

/// The first populated answer field of a JSON object response
fn extract_answer(data: &Value) -> Option<String> {
    let object = data.as_object()?;
    ANSWER_FIELDS
        .iter()
        .filter_map(|field| object.get(*field))
        .find_map(|value| match value {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
}

fn absolutize(href: &str, base: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| {
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                href.trim_start_matches('/')
            )
        })
}

/// Remove a trailing "Cited Sources:" block, turning each link in it into a citation
pub(crate) fn split_cited_sources(answer: &str, base_url: &str) -> (String, Vec<Citation>) {
    // the block trails the answer, so an earlier mention of the phrase is body text
    let Some(marker) = CITED_SOURCES.find_iter(answer).last() else {
        return (answer.to_string(), Vec::new());
    };

    let block = &answer[marker.end()..];
    let citations = ANCHOR
        .captures_iter(block)
        .map(|caps| {
            let href = caps[1].trim();
            let text = caps[2].trim();
            Citation::new(text).with_url(absolutize(href, base_url))
        })
        .collect();

    (answer[..marker.start()].trim_end().to_string(), citations)
}

#[async_trait]
impl Tool for ExpertQaTool {
    fn signature(&self) -> ToolSignature {
        ToolSignature::new(
            EXPERT_TOOL_NAME,
            "Ask a nutrition expert about food, diet, or nutrition-related questions. Use this tool ONLY for questions about nutrition, food, diet, eating habits, nutritional values, or meal planning.",
            json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "The nutrition, food, or diet-related question to ask the expert"
                    }
                },
                "required": ["question"]
            }),
        )
    }

    async fn execute(&self, args: &Map<String, Value>) -> ToolResult<String> {
        let question = required_str(args, "question")?;

        match self.ask(question).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                warn!(error = ?e, "nutrition expert query failed");
                self.citations.clear();
                Ok(e.to_string())
            }
        }
    }

    fn citations(&self) -> Vec<Citation> {
        self.citations.snapshot()
    }

    fn clear_citations(&self) {
        self.citations.clear()
    }
}
