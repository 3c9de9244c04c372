//! The contract between the course tools and the course search service
//!
//! Ranking, embedding and storage all live behind [`SearchProvider`]. The tools only depend on
//! the shapes below.
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod remote;

/// Filters for one search request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,
}

impl SearchQuery {
    pub fn new<S: Into<String>>(query: S) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_course<S: Into<String>>(mut self, course_name: S) -> Self {
        self.course_name = Some(course_name.into());
        self
    }

    pub fn with_lesson(mut self, lesson_number: u32) -> Self {
        self.lesson_number = Some(lesson_number);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitMetadata {
    #[serde(default = "unknown_course")]
    pub course_title: String,
    #[serde(default)]
    pub lesson_number: Option<u32>,
}

impl HitMetadata {
    fn unknown() -> Self {
        Self {
            course_title: unknown_course(),
            lesson_number: None,
        }
    }
}

fn unknown_course() -> String {
    "unknown".to_string()
}

/// Ranked documents returned for a query, or a named error the service chose to report
///
/// `documents` and `metadata` are parallel lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub metadata: Vec<HitMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResults {
    pub fn from_error<S: Into<String>>(error: S) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn push<S: Into<String>>(&mut self, document: S, course_title: &str, lesson_number: Option<u32>) {
        self.documents.push(document.into());
        self.metadata.push(HitMetadata {
            course_title: course_title.to_string(),
            lesson_number,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Each document with its metadata
    ///
    /// Documents the service sent without a metadata entry are attributed to an unknown course
    /// rather than dropped.
    pub fn hits(&self) -> impl Iterator<Item = (&str, HitMetadata)> + '_ {
        self.documents.iter().enumerate().map(|(i, document)| {
            let meta = self
                .metadata
                .get(i)
                .cloned()
                .unwrap_or_else(HitMetadata::unknown);
            (document.as_str(), meta)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonSummary {
    pub lesson_number: u32,
    pub lesson_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseOutline {
    pub course_title: String,
    #[serde(default)]
    pub course_link: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub lessons: Vec<LessonSummary>,
}

/// Read access to the indexed course catalog
///
/// `Err` means the service itself could not be consulted. Conditions the service reports in
/// band, such as an unknown course filter, come back as [`SearchResults::error`].
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults>;

    /// Outline of the course whose title best matches `course_title`, if any does
    async fn course_outline(&self, course_title: &str) -> Result<Option<CourseOutline>>;

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>>;

    async fn course_titles(&self) -> Result<Vec<String>>;
}
