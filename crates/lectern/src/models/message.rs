use super::role::Role;
use super::tool::ToolInvocationRequest;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    pub created: i64,
    /// Text content; assistant messages that only request tools may carry none
    pub content: Option<String>,
    /// Tool requests made by an assistant message, in the order the model listed them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocationRequest>,
    /// For tool messages, the id of the request this result answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn new(role: Role) -> Self {
        Message {
            role,
            created: Utc::now().timestamp(),
            content: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a new system message with the current timestamp
    pub fn system() -> Self {
        Self::new(Role::System)
    }

    /// Create a new user message with the current timestamp
    pub fn user() -> Self {
        Self::new(Role::User)
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant() -> Self {
        Self::new(Role::Assistant)
    }

    /// Create a tool result message answering the request with the given id
    pub fn tool<S: Into<String>>(tool_call_id: S) -> Self {
        Message {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(Role::Tool)
        }
    }

    /// Set the text content of the message
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.content = Some(text.into());
        self
    }

    /// Add a tool request to the message
    pub fn with_tool_request<I, N, A>(mut self, id: I, name: N, arguments: A) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        self.tool_calls
            .push(ToolInvocationRequest::new(id, name, arguments));
        self
    }

    pub fn has_tool_requests(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The text content, or an empty string when the message has none
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let message = Message::assistant()
            .with_tool_request("call_1", "search_course_content", r#"{"query":"x"}"#)
            .with_tool_request("call_2", "get_course_outline", r#"{"course_title":"y"}"#);

        assert_eq!(message.role, Role::Assistant);
        assert!(message.content.is_none());
        assert_eq!(message.text(), "");
        assert!(message.has_tool_requests());
        assert_eq!(message.tool_calls[1].id, "call_2");

        let result = Message::tool("call_1").with_text("found it");
        assert_eq!(result.role, Role::Tool);
        assert_eq!(result.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(result.text(), "found it");
        assert!(!result.has_tool_requests());
    }
}
