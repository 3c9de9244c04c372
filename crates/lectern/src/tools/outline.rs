use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{required_str, Tool};
use crate::errors::{ToolError, ToolResult};
use crate::models::tool::ToolSignature;
use crate::search::{CourseOutline, SearchProvider};

pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

pub struct OutlineTool {
    provider: Arc<dyn SearchProvider>,
}

impl OutlineTool {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

fn format_outline(outline: &CourseOutline) -> String {
    let mut parts = vec![format!("Course: {}", outline.course_title)];

    if let Some(link) = outline.course_link.as_deref().filter(|l| !l.is_empty()) {
        parts.push(format!("Link: {}", link));
    }
    if let Some(instructor) = outline.instructor.as_deref().filter(|i| !i.is_empty()) {
        parts.push(format!("Instructor: {}", instructor));
    }

    if !outline.lessons.is_empty() {
        parts.push(format!("\nLessons ({} total):", outline.lessons.len()));
        for lesson in &outline.lessons {
            parts.push(format!(
                "  Lesson {}: {}",
                lesson.lesson_number, lesson.lesson_title
            ));
        }
    }

    parts.join("\n")
}

#[async_trait]
impl Tool for OutlineTool {
    fn signature(&self) -> ToolSignature {
        ToolSignature::new(
            OUTLINE_TOOL_NAME,
            "Get the complete outline and structure of a course, including all lessons",
            json!({
                "type": "object",
                "properties": {
                    "course_title": {
                        "type": "string",
                        "description": "The course title or name (partial matches work, e.g. 'MCP', 'Introduction')"
                    }
                },
                "required": ["course_title"]
            }),
        )
    }

    async fn execute(&self, args: &Map<String, Value>) -> ToolResult<String> {
        let course_title = required_str(args, "course_title")?;

        let outline = self
            .provider
            .course_outline(course_title)
            .await
            .map_err(|e| ToolError::ExecutionError(format!("search service unavailable: {:#}", e)))?;

        Ok(match outline {
            Some(outline) => format_outline(&outline),
            None => format!("No course found matching '{}'.", course_title),
        })
    }
}
