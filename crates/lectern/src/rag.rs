use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::errors::RagError;
use crate::models::citation::Citation;
use crate::orchestrator::{Orchestrator, DEFAULT_MAX_TOOL_ROUNDS};
use crate::prompt_template::system_prompt;
use crate::providers::base::Provider;
use crate::search::SearchProvider;
use crate::session::{SessionManager, DEFAULT_MAX_HISTORY};
use crate::tools::{ExpertQaTool, OutlineTool, SearchTool, Tool, ToolRegistry};

#[derive(Debug, Clone, Copy)]
pub struct RagOptions {
    pub max_tool_rounds: usize,
    pub max_history: usize,
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<Citation>,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// Question answering over the course catalog, with per-session memory
pub struct RagSystem {
    orchestrator: Orchestrator,
    registry: ToolRegistry,
    search: Arc<dyn SearchProvider>,
    sessions: SessionManager,
    // citation buffers are shared by all queries; one query at a time keeps them attributable
    query_lock: Mutex<()>,
}

impl RagSystem {
    /// Wire up the standard tool set: course search, course outline and the nutrition expert
    pub fn new(
        provider: Arc<dyn Provider>,
        search: Arc<dyn SearchProvider>,
        expert: ExpertQaTool,
        options: RagOptions,
    ) -> Result<Self, RagError> {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(SearchTool::new(search.clone())),
            Arc::new(OutlineTool::new(search.clone())),
            Arc::new(expert),
        ];

        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Self::with_registry(provider, search, registry, options)
    }

    pub fn with_registry(
        provider: Arc<dyn Provider>,
        search: Arc<dyn SearchProvider>,
        registry: ToolRegistry,
        options: RagOptions,
    ) -> Result<Self, RagError> {
        let prompt = system_prompt(&registry.signatures(), options.max_tool_rounds)?;
        let orchestrator =
            Orchestrator::new(provider, prompt).with_max_tool_rounds(options.max_tool_rounds);

        Ok(Self {
            orchestrator,
            registry,
            search,
            sessions: SessionManager::new(options.max_history),
            query_lock: Mutex::new(()),
        })
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Answer a question, continuing `session_id` or starting a new session
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> Result<QueryResponse, RagError> {
        let _guard = self.query_lock.lock().await;

        let session_id = match session_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.sessions.create_session(),
        };
        let history = self.sessions.conversation_history(&session_id);
        let tools = self.registry.signatures();

        let result = self
            .orchestrator
            .generate(query, history.as_deref(), &tools, Some(&self.registry))
            .await;
        let sources = self.registry.latest_citations();
        self.registry.clear_citations();
        let answer = result?;

        self.sessions.add_exchange(&session_id, query, &answer);
        info!(session = %session_id, sources = sources.len(), "query answered");

        Ok(QueryResponse {
            answer,
            sources,
            session_id,
        })
    }

    pub async fn course_analytics(&self) -> Result<CourseAnalytics, RagError> {
        let course_titles = self.search.course_titles().await?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }
}
