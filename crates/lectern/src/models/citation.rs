use serde::{Deserialize, Serialize};

/// A pointer to the source material a tool consulted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Label shown to the user, e.g. "Course X - Lesson 2"
    pub text: String,
    /// Deep link to the material, when one is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Citation {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            url: None,
        }
    }

    pub fn with_url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = Some(url.into());
        self
    }
}
