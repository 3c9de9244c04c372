use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::message::Message;
use crate::models::tool::ToolSignature;
use crate::providers::base::{Provider, Usage};

/// One completion request as the mock received it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSignature>,
}

/// A mock provider that returns pre-configured responses for testing
///
/// Replies are handed out in order. Once the script is exhausted every further call fails,
/// so a test that makes more completion calls than it scripted notices.
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Result<Message, String>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().map(Ok).collect())),
            requests: Arc::default(),
        }
    }

    /// Queue a failed completion, as if the endpoint were unreachable
    pub fn push_error<S: Into<String>>(&self, error: S) {
        lock(&self.responses).push_back(Err(error.into()));
    }

    /// Number of completion calls received so far
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSignature],
    ) -> Result<(Message, Usage)> {
        lock(&self.requests).push(RecordedRequest {
            messages: messages.to_vec(),
            tools: tools.to_vec(),
        });

        match lock(&self.responses).pop_front() {
            Some(Ok(message)) => Ok((message, Usage::default())),
            Some(Err(error)) => Err(anyhow!(error)),
            None => Err(anyhow!("MockProvider has no scripted response left")),
        }
    }
}
