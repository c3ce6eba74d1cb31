use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::snippets::repo_types::{Snippet, SnippetFields};

/// Snippet persistence. `update` and `delete` return the number of rows
/// touched so callers can tell a missing id from a no-op.
#[async_trait]
pub trait SnippetStore: Send + Sync {
    async fn insert(&self, fields: &SnippetFields, owner: Option<i64>) -> AppResult<i64>;
    async fn find(&self, id: i64) -> AppResult<Option<Snippet>>;
    async fn update(&self, id: i64, fields: &SnippetFields) -> AppResult<u64>;
    async fn delete(&self, id: i64) -> AppResult<u64>;
    /// Titles containing `query`, case-insensitively, in store order.
    async fn search_title(&self, query: &str) -> AppResult<Vec<Snippet>>;
    /// Everything, newest first.
    async fn list_recent(&self) -> AppResult<Vec<Snippet>>;
}

const SELECT_WITH_OWNER: &str = r#"
    SELECT s.id, s.user_id, s.title, s.code, s.description, s.language, s.created_at,
           u.username
      FROM snippets s
      LEFT JOIN users u ON s.user_id = u.id
"#;

/// Escapes LIKE metacharacters so the user's query matches literally.
pub(crate) fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 2);
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Clone)]
pub struct PgSnippetStore {
    db: PgPool,
}

impl PgSnippetStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SnippetStore for PgSnippetStore {
    async fn insert(&self, fields: &SnippetFields, owner: Option<i64>) -> AppResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO snippets (title, code, description, language, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.code)
        .bind(&fields.description)
        .bind(&fields.language)
        .bind(owner) // Option<i64> → NULL allowed
        .fetch_one(&self.db)
        .await?;
        Ok(id)
    }

    async fn find(&self, id: i64) -> AppResult<Option<Snippet>> {
        let sql = format!("{SELECT_WITH_OWNER} WHERE s.id = $1");
        let row = sqlx::query_as::<_, Snippet>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn update(&self, id: i64, fields: &SnippetFields) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE snippets
               SET title = $1, code = $2, description = $3, language = $4
             WHERE id = $5
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.code)
        .bind(&fields.description)
        .bind(&fields.language)
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM snippets WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    async fn search_title(&self, query: &str) -> AppResult<Vec<Snippet>> {
        let sql = format!("{SELECT_WITH_OWNER} WHERE s.title ILIKE $1");
        let rows = sqlx::query_as::<_, Snippet>(&sql)
            .bind(format!("%{}%", escape_like(query)))
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn list_recent(&self) -> AppResult<Vec<Snippet>> {
        let sql = format!("{SELECT_WITH_OWNER} ORDER BY s.created_at DESC, s.id DESC");
        let rows = sqlx::query_as::<_, Snippet>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }
}
