use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{CourseOutline, SearchProvider, SearchQuery, SearchResults};

pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct RemoteSearchConfig {
    pub base_url: String,
    pub max_results: usize,
    pub timeout: Duration,
}

impl RemoteSearchConfig {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    #[serde(flatten)]
    query: &'a SearchQuery,
    limit: usize,
}

#[derive(Deserialize)]
struct LessonLinkResponse {
    url: Option<String>,
}

#[derive(Deserialize)]
struct CoursesResponse {
    #[serde(default)]
    course_titles: Vec<String>,
}

/// Search provider backed by the course search service's JSON API
pub struct RemoteSearchProvider {
    client: Client,
    config: RemoteSearchConfig,
}

impl RemoteSearchProvider {
    pub fn new(config: RemoteSearchConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl SearchProvider for RemoteSearchProvider {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        debug!(query = %query.query, course = ?query.course_name, lesson = ?query.lesson_number, "searching course content");
        let response = self
            .client
            .post(self.url("search"))
            .json(&SearchRequest {
                query,
                limit: self.config.max_results,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Search request failed: {}", response.status()));
        }
        Ok(response.json().await?)
    }

    async fn course_outline(&self, course_title: &str) -> Result<Option<CourseOutline>> {
        let response = self
            .client
            .get(self.url("outline"))
            .query(&[("course_title", course_title)])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(anyhow!("Outline request failed: {}", status)),
        }
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.url("lesson_link"))
            .query(&[
                ("course_title", course_title.to_string()),
                ("lesson_number", lesson_number.to_string()),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: LessonLinkResponse = response.json().await?;
                Ok(body.url.filter(|url| !url.is_empty()))
            }
            status => Err(anyhow!("Lesson link request failed: {}", status)),
        }
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let response = self.client.get(self.url("courses")).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Course list request failed: {}", response.status()));
        }
        let body: CoursesResponse = response.json().await?;
        Ok(body.course_titles)
    }
}
