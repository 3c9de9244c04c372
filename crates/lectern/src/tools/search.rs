use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::warn;

use super::{optional_str, optional_u32, required_str, CitationBuffer, Tool};
use crate::errors::{ToolError, ToolResult};
use crate::models::citation::Citation;
use crate::models::tool::ToolSignature;
use crate::search::{SearchProvider, SearchQuery, SearchResults};

pub const SEARCH_TOOL_NAME: &str = "search_course_content";

/// Searches course material, optionally narrowed to one course and lesson
pub struct SearchTool {
    provider: Arc<dyn SearchProvider>,
    citations: CitationBuffer,
}

impl SearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            provider,
            citations: CitationBuffer::default(),
        }
    }

    async fn format_results(&self, results: &SearchResults) -> String {
        let mut formatted = Vec::with_capacity(results.documents.len());
        let mut citations = Vec::with_capacity(results.documents.len());

        for (document, meta) in results.hits() {
            let label = match meta.lesson_number {
                Some(lesson) => format!("{} - Lesson {}", meta.course_title, lesson),
                None => meta.course_title.clone(),
            };

            let mut citation = Citation::new(label.as_str());
            if let Some(lesson) = meta.lesson_number {
                match self.provider.lesson_link(&meta.course_title, lesson).await {
                    Ok(Some(url)) => citation = citation.with_url(url),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(course = %meta.course_title, lesson, error = %e, "lesson link lookup failed")
                    }
                }
            }

            formatted.push(format!("[{}]\n{}", label, document));
            citations.push(citation);
        }

        self.citations.replace(citations);
        formatted.join("\n\n")
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn signature(&self) -> ToolSignature {
        ToolSignature::new(
            SEARCH_TOOL_NAME,
            "Search course materials with smart course name matching and lesson filtering",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        )
    }

    async fn execute(&self, args: &Map<String, Value>) -> ToolResult<String> {
        let mut query = SearchQuery::new(required_str(args, "query")?);
        query.course_name = optional_str(args, "course_name")?.map(str::to_string);
        query.lesson_number = optional_u32(args, "lesson_number")?;

        let results = self
            .provider
            .search(&query)
            .await
            .map_err(|e| ToolError::ExecutionError(format!("search service unavailable: {:#}", e)))?;

        if let Some(error) = &results.error {
            return Ok(error.clone());
        }

        if results.is_empty() {
            let mut filter_info = String::new();
            if let Some(course) = &query.course_name {
                filter_info.push_str(&format!(" in course '{}'", course));
            }
            if let Some(lesson) = query.lesson_number {
                filter_info.push_str(&format!(" in lesson {}", lesson));
            }
            return Ok(format!("No relevant content found{}.", filter_info));
        }

        Ok(self.format_results(&results).await)
    }

    fn citations(&self) -> Vec<Citation> {
        self.citations.snapshot()
    }

    fn clear_citations(&self) {
        self.citations.clear()
    }
}
