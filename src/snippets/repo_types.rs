use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Snippet row joined with its owner's username.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Snippet {
    pub id: i64,
    pub user_id: Option<i64>, // None for anonymous or removed owners
    pub title: String,
    pub code: String,
    pub description: Option<String>,
    pub language: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub username: Option<String>,
}

/// The user-editable part of a snippet, shared by create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SnippetFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: String,
}

impl SnippetFields {
    /// Blank descriptions are stored as NULL.
    pub fn normalized(mut self) -> Self {
        if self
            .description
            .as_deref()
            .is_some_and(|d| d.trim().is_empty())
        {
            self.description = None;
        }
        self
    }
}
