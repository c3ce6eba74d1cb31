use serde::{Deserialize, Serialize};

use crate::snippets::repo_types::Snippet;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SnippetListResponse {
    pub snippets: Vec<Snippet>,
}

#[derive(Debug, Serialize)]
pub struct SnippetResponse {
    pub snippet: Snippet,
}

#[derive(Debug, Serialize)]
pub struct CreatedSnippetResponse {
    pub message: &'static str,
    #[serde(rename = "snippetId")]
    pub snippet_id: i64,
}
