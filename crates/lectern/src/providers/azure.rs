use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use super::base::{Provider, Usage};
use super::configs::AzureOpenAiProviderConfig;
use super::utils::{
    check_openai_context_length_error, messages_to_openai_spec, openai_response_to_message,
    tools_to_openai_spec,
};
use crate::models::message::Message;
use crate::models::tool::ToolSignature;

/// Chat-completions client for an Azure OpenAI deployment
pub struct AzureOpenAiProvider {
    client: Client,
    config: AzureOpenAiProviderConfig,
}

impl AzureOpenAiProvider {
    pub fn new(config: AzureOpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, config })
    }

    fn get_usage(data: &Value) -> Usage {
        let Some(usage) = data.get("usage") else {
            return Usage::default();
        };

        let input_tokens = usage
            .get("prompt_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let output_tokens = usage
            .get("completion_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let total_tokens = usage
            .get("total_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32)
            .or_else(|| match (input_tokens, output_tokens) {
                (Some(input), Some(output)) => Some(input + output),
                _ => None,
            });

        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );
        let token = self.config.credentials.get_token().await?;

        let response = self
            .client
            .post(&url)
            .query(&[("api-version", self.config.api_version.as_str())])
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            status => {
                // Azure reports context overflows as a 400 with an error body
                let body: Value = response.json().await.unwrap_or(Value::Null);
                if let Some(err) = body
                    .get("error")
                    .and_then(check_openai_context_length_error)
                {
                    return Err(err.into());
                }
                Err(anyhow!("Request failed: {}\nResponse: {}", status, body))
            }
        }
    }
}

#[async_trait]
impl Provider for AzureOpenAiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSignature],
    ) -> Result<(Message, Usage)> {
        let mut payload = json!({
            "model": self.config.deployment,
            "messages": messages_to_openai_spec(messages),
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        if !tools.is_empty() {
            payload["tools"] = json!(tools_to_openai_spec(tools)?);
            payload["tool_choice"] = json!("auto");
        }

        debug!(
            deployment = %self.config.deployment,
            messages = messages.len(),
            tools = tools.len(),
            "requesting completion"
        );
        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            if let Some(err) = check_openai_context_length_error(error) {
                return Err(err.into());
            }
            return Err(anyhow!("Azure OpenAI API error: {}", error));
        }

        let message = openai_response_to_message(&response)?;
        let usage = Self::get_usage(&response);

        Ok((message, usage))
    }
}
