use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::snippets::repo::SnippetStore;
use crate::snippets::repo_types::{Snippet, SnippetFields};
use crate::validation::{into_result, validate_search, validate_snippet};

const NOT_FOUND: &str = "Snippet not found";

#[derive(Clone)]
pub struct SnippetService {
    store: Arc<dyn SnippetStore>,
}

impl SnippetService {
    pub fn new(store: Arc<dyn SnippetStore>) -> Self {
        Self { store }
    }

    /// Stores a new snippet, anonymous when `owner` is `None`, and returns its id.
    pub async fn create(&self, fields: SnippetFields, owner: Option<i64>) -> AppResult<i64> {
        into_result(validate_snippet(&fields.title, &fields.code, &fields.language))?;
        let fields = fields.normalized();
        let id = self.store.insert(&fields, owner).await?;
        info!(snippet_id = id, owner = ?owner, language = %fields.language, "snippet created");
        Ok(id)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Snippet> {
        self.store
            .find(id)
            .await?
            .ok_or(AppError::NotFound(NOT_FOUND))
    }

    /// Replaces title, code, description and language. Owner and creation
    /// time are never touched.
    pub async fn update(&self, id: i64, fields: SnippetFields) -> AppResult<()> {
        into_result(validate_snippet(&fields.title, &fields.code, &fields.language))?;
        let fields = fields.normalized();
        if self.store.update(id, &fields).await? == 0 {
            return Err(AppError::NotFound(NOT_FOUND));
        }
        info!(snippet_id = id, "snippet updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if self.store.delete(id).await? == 0 {
            return Err(AppError::NotFound(NOT_FOUND));
        }
        info!(snippet_id = id, "snippet deleted");
        Ok(())
    }

    pub async fn search(&self, query: &str) -> AppResult<Vec<Snippet>> {
        into_result(validate_search(query))?;
        let rows = self.store.search_title(query).await?;
        debug!(query = %query, hits = rows.len(), "snippet search");
        Ok(rows)
    }

    pub async fn list(&self) -> AppResult<Vec<Snippet>> {
        self.store.list_recent().await
    }
}
