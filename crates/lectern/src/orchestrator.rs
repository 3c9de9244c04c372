//! The multi-round tool-calling loop
//!
//! Each [`Orchestrator::generate`] call builds a fresh transcript, then alternates between
//! asking the model for the next message and executing the tools it requests, until the model
//! answers in plain text, a tool call fails, or the round limit is reached. Tool problems are
//! reported back to the model as `tool` messages; only a failing completion endpoint is an
//! error for the caller.
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::errors::GenerationError;
use crate::models::message::Message;
use crate::models::role::Role;
use crate::models::tool::{ToolInvocationRequest, ToolSignature};
use crate::providers::base::Provider;
use crate::tools::ToolRegistry;

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 2;

const INVALID_ARGUMENTS: &str = "Error: Invalid tool arguments format";

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    /// Tool round `n`, counting from 1
    RoundActive(usize),
    Synthesizing,
    Done(String),
}

/// Transcript and bookkeeping for one `generate` call
#[derive(Debug)]
struct RoundState {
    round: usize,
    messages: Vec<Message>,
    failed: bool,
}

impl RoundState {
    fn new(system_prompt: &str, history: Option<&str>, query: &str) -> Self {
        let mut messages = vec![Message::system().with_text(system_prompt)];
        if let Some(history) = history.filter(|h| !h.is_empty()) {
            messages.push(Message::system().with_text(format!("Previous conversation:\n{}", history)));
        }
        messages.push(Message::user().with_text(query));

        Self {
            round: 0,
            messages,
            failed: false,
        }
    }
}

pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    system_prompt: String,
    max_tool_rounds: usize,
}

impl Orchestrator {
    pub fn new<S: Into<String>>(provider: Arc<dyn Provider>, system_prompt: S) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    pub fn max_tool_rounds(&self) -> usize {
        self.max_tool_rounds
    }

    /// Answer `query`, letting the model call tools from `registry` for up to
    /// `max_tool_rounds` rounds
    ///
    /// Makes at most `max_tool_rounds + 1` completion calls. Tools are only offered when both
    /// `tools` is non-empty and a registry is supplied.
    pub async fn generate(
        &self,
        query: &str,
        history: Option<&str>,
        tools: &[ToolSignature],
        registry: Option<&ToolRegistry>,
    ) -> Result<String, GenerationError> {
        let offered: &[ToolSignature] = match registry {
            Some(_) => tools,
            None => &[],
        };
        let mut state = RoundState::new(&self.system_prompt, history, query);
        let mut phase = if self.max_tool_rounds == 0 {
            Phase::Synthesizing
        } else {
            Phase::RoundActive(1)
        };

        loop {
            phase = match phase {
                Phase::RoundActive(n) => self.run_round(n, &mut state, offered, registry).await?,
                Phase::Synthesizing => self.synthesize(&state, offered).await?,
                Phase::Done(answer) => {
                    info!(rounds = state.round, "generation finished");
                    return Ok(answer);
                }
            };
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSignature],
    ) -> Result<Message, GenerationError> {
        let (reply, usage) = self.provider.complete(messages, tools).await?;
        debug!(
            input_tokens = ?usage.input_tokens,
            output_tokens = ?usage.output_tokens,
            tool_requests = reply.tool_calls.len(),
            "completion received"
        );
        Ok(reply)
    }

    async fn run_round(
        &self,
        n: usize,
        state: &mut RoundState,
        tools: &[ToolSignature],
        registry: Option<&ToolRegistry>,
    ) -> Result<Phase, GenerationError> {
        state.round = n;
        state.failed = false;
        debug!(round = n, "starting tool round");

        let reply = self.complete(&state.messages, tools).await?;
        if !reply.has_tool_requests() {
            return Ok(Phase::Done(reply.text().to_string()));
        }

        let Some(registry) = registry else {
            warn!(
                requests = reply.tool_calls.len(),
                "model requested tools but no registry was supplied"
            );
            return Ok(Phase::Done(reply.text().to_string()));
        };

        let requests = reply.tool_calls.clone();
        state.messages.push(reply);

        for request in &requests {
            let content = self.execute_request(request, registry, &mut state.failed).await;
            state.messages.push(Message::tool(request.id.as_str()).with_text(content));
        }

        if state.failed {
            debug!(round = n, "a tool call failed, stopping rounds");
            Ok(Phase::Synthesizing)
        } else if n >= self.max_tool_rounds {
            Ok(Phase::Synthesizing)
        } else {
            Ok(Phase::RoundActive(n + 1))
        }
    }

    async fn execute_request(
        &self,
        request: &ToolInvocationRequest,
        registry: &ToolRegistry,
        failed: &mut bool,
    ) -> String {
        let args = match request.parse_arguments() {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = %request.name, call_id = %request.id, error = %e, "malformed tool arguments");
                *failed = true;
                return INVALID_ARGUMENTS.to_string();
            }
        };

        debug!(tool = %request.name, call_id = %request.id, "executing tool");
        match registry.invoke(&request.name, &args).await {
            Ok(text) => text,
            Err(e) => {
                warn!(tool = %request.name, call_id = %request.id, error = %e, "tool execution failed");
                *failed = true;
                format!("Error: Tool execution failed - {}", e)
            }
        }
    }

    async fn synthesize(
        &self,
        state: &RoundState,
        tools: &[ToolSignature],
    ) -> Result<Phase, GenerationError> {
        match state.messages.last().map(|m| &m.role) {
            Some(Role::Tool) => {
                debug!("synthesizing final answer from tool results");
                let reply = self.complete(&state.messages, tools).await?;
                Ok(Phase::Done(reply.text().to_string()))
            }
            Some(Role::User) => {
                // no rounds were allowed; answer directly without offering tools
                let reply = self.complete(&state.messages, &[]).await?;
                Ok(Phase::Done(reply.text().to_string()))
            }
            _ => {
                let text = state
                    .messages
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::Assistant)
                    .map(|m| m.text().to_string())
                    .unwrap_or_default();
                Ok(Phase::Done(text))
            }
        }
    }
}
