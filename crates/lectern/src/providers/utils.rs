use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use crate::models::message::Message;
use crate::models::role::Role;
use crate::models::tool::{ToolInvocationRequest, ToolSignature};

/// Convert internal Message format to OpenAI's API message specification
///
/// Assistant tool requests are echoed with their original ids and raw argument payloads so
/// that the following `tool` messages correlate with them.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let mut converted = json!({
                "role": message.role,
                "content": message.content,
            });

            if message.role == Role::Assistant && message.has_tool_requests() {
                let tool_calls: Vec<Value> = message
                    .tool_calls
                    .iter()
                    .map(|request| {
                        json!({
                            "id": request.id,
                            "type": "function",
                            "function": {
                                "name": request.name,
                                "arguments": request.arguments,
                            }
                        })
                    })
                    .collect();
                converted["tool_calls"] = json!(tool_calls);
            }

            if let Some(id) = &message.tool_call_id {
                converted["tool_call_id"] = json!(id);
            }

            converted
        })
        .collect()
}

/// Convert internal tool signatures to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[ToolSignature]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Convert OpenAI's API response to internal Message format
///
/// Argument payloads are kept as raw text. Parsing them is the orchestrator's job, since a
/// malformed payload is a per-call failure rather than a malformed response.
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .filter(|message| message.is_object())
        .ok_or_else(|| anyhow!("Malformed completion response: missing choices[0].message"))?;

    let mut message = Message::assistant();
    if let Some(text) = original.get("content").and_then(|c| c.as_str()) {
        message.content = Some(text.to_string());
    }

    if let Some(tool_calls) = original.get("tool_calls").and_then(|t| t.as_array()) {
        for tool_call in tool_calls {
            let id = tool_call["id"].as_str().unwrap_or_default();
            let name = tool_call["function"]["name"].as_str().unwrap_or_default();
            let arguments = match &tool_call["function"]["arguments"] {
                Value::String(raw) => raw.clone(),
                Value::Null => String::new(),
                // Some compatible endpoints send the arguments already decoded
                other => other.to_string(),
            };
            message
                .tool_calls
                .push(ToolInvocationRequest::new(id, name, arguments));
        }
    }

    Ok(message)
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}
