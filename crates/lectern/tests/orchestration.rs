use anyhow::Result;
use async_trait::async_trait;
use lectern::models::citation::Citation;
use lectern::models::message::Message;
use lectern::models::role::Role;
use lectern::providers::mock::MockProvider;
use lectern::rag::{RagOptions, RagSystem};
use lectern::search::{CourseOutline, LessonSummary, SearchProvider, SearchQuery, SearchResults};
use lectern::tools::{ExpertQaConfig, ExpertQaTool};
use std::sync::Arc;

/// A small two-course catalog
struct Catalog;

impl Catalog {
    fn outline() -> CourseOutline {
        CourseOutline {
            course_title: "MCP: Build Rich-Context AI Apps with Anthropic".into(),
            course_link: Some("https://example.com/mcp".into()),
            instructor: Some("Elie Schoppik".into()),
            lessons: vec![
                LessonSummary {
                    lesson_number: 4,
                    lesson_title: "Creating an MCP Client".into(),
                },
                LessonSummary {
                    lesson_number: 5,
                    lesson_title: "Connecting to Reference Servers".into(),
                },
            ],
        }
    }
}

#[async_trait]
impl SearchProvider for Catalog {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        match query.course_name.as_deref() {
            Some("Quantum Basket Weaving") => Ok(SearchResults::from_error(
                "No course found matching 'Quantum Basket Weaving'",
            )),
            _ => {
                let mut results = SearchResults::default();
                results.push(
                    "A client keeps a 1:1 session with a server.",
                    "Advanced Retrieval for AI",
                    Some(2),
                );
                Ok(results)
            }
        }
    }

    async fn course_outline(&self, course_title: &str) -> Result<Option<CourseOutline>> {
        Ok(course_title
            .to_lowercase()
            .contains("mcp")
            .then(Catalog::outline))
    }

    async fn lesson_link(&self, _course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        Ok(Some(format!("https://example.com/retrieval/{}", lesson_number)))
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        Ok(vec![
            "MCP: Build Rich-Context AI Apps with Anthropic".into(),
            "Advanced Retrieval for AI".into(),
        ])
    }
}

fn rag(provider: &MockProvider) -> RagSystem {
    // no credential provider: the expert tool degrades to an error text
    let expert = ExpertQaTool::new(ExpertQaConfig::default(), None).unwrap();
    RagSystem::new(
        Arc::new(provider.clone()),
        Arc::new(Catalog),
        expert,
        RagOptions::default(),
    )
    .unwrap()
}

fn tool_results(provider: &MockProvider, request: usize) -> Vec<String> {
    provider.requests()[request]
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.text().to_string())
        .collect()
}

#[tokio::test]
async fn test_general_knowledge_question_uses_no_tools() {
    let provider = MockProvider::new(vec![Message::assistant()
        .with_text("Anthropic is an AI safety company that builds Claude.")]);
    let rag = rag(&provider);

    let response = rag.query("What is Anthropic?", None).await.unwrap();

    assert_eq!(response.answer, "Anthropic is an AI safety company that builds Claude.");
    assert!(response.sources.is_empty());
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_outline_then_search_across_two_rounds() {
    let provider = MockProvider::new(vec![
        Message::assistant().with_tool_request(
            "call_outline",
            "get_course_outline",
            r#"{"course_title": "MCP"}"#,
        ),
        Message::assistant().with_tool_request(
            "call_search",
            "search_course_content",
            r#"{"query": "Creating an MCP Client", "lesson_number": 2}"#,
        ),
        Message::assistant().with_text("Lesson 2 of Advanced Retrieval covers client sessions."),
    ]);
    let rag = rag(&provider);

    let response = rag
        .query(
            "Which course discusses the same topic as lesson 4 of the MCP course?",
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.answer, "Lesson 2 of Advanced Retrieval covers client sessions.");
    assert_eq!(provider.call_count(), 3);
    assert_eq!(
        response.sources,
        vec![Citation::new("Advanced Retrieval for AI - Lesson 2")
            .with_url("https://example.com/retrieval/2")]
    );

    let results = tool_results(&provider, 2);
    assert_eq!(results.len(), 2);
    assert!(results[0].starts_with("Course: MCP: Build Rich-Context AI Apps with Anthropic"));
    assert!(results[0].contains("  Lesson 4: Creating an MCP Client"));
    assert_eq!(
        results[1],
        "[Advanced Retrieval for AI - Lesson 2]\nA client keeps a 1:1 session with a server."
    );
}

#[tokio::test]
async fn test_provider_named_error_reaches_the_model() {
    let provider = MockProvider::new(vec![
        Message::assistant().with_tool_request(
            "c1",
            "search_course_content",
            r#"{"query": "loops", "course_name": "Quantum Basket Weaving"}"#,
        ),
        Message::assistant().with_text("I couldn't find that course."),
    ]);
    let rag = rag(&provider);

    let response = rag.query("Loops in Quantum Basket Weaving?", None).await.unwrap();

    assert_eq!(response.answer, "I couldn't find that course.");
    assert!(response.sources.is_empty());
    assert_eq!(
        tool_results(&provider, 1),
        vec!["No course found matching 'Quantum Basket Weaving'"]
    );
}

#[tokio::test]
async fn test_nutrition_question_without_credentials_degrades() {
    let provider = MockProvider::new(vec![
        Message::assistant().with_tool_request(
            "c1",
            "ask_nutrition_expert",
            r#"{"question": "What vitamins are in spinach?"}"#,
        ),
        Message::assistant().with_text("Nutrition answers are unavailable right now."),
    ]);
    let rag = rag(&provider);

    let response = rag.query("What vitamins are in spinach?", None).await.unwrap();

    assert_eq!(response.answer, "Nutrition answers are unavailable right now.");
    assert!(response.sources.is_empty());
    assert_eq!(
        tool_results(&provider, 1),
        vec!["Error: Authentication not configured for nutrition queries."]
    );
}

#[tokio::test]
async fn test_stale_sources_do_not_leak_into_the_next_query() {
    let provider = MockProvider::new(vec![
        Message::assistant().with_tool_request("c1", "search_course_content", r#"{"query": "x"}"#),
        Message::assistant().with_text("first"),
        Message::assistant().with_text("second"),
    ]);
    let rag = rag(&provider);

    let first = rag.query("first", None).await.unwrap();
    assert_eq!(first.sources.len(), 1);

    let second = rag.query("second", Some(&first.session_id)).await.unwrap();
    assert!(second.sources.is_empty());
}

#[tokio::test]
async fn test_course_analytics_lists_catalog() {
    let rag = rag(&MockProvider::default());
    let analytics = rag.course_analytics().await.unwrap();
    assert_eq!(analytics.total_courses, 2);
}
