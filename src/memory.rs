//! Process-local store backing all three store traits. Mirrors the
//! PostgreSQL schema rules: unique usernames, `ON DELETE SET NULL` for
//! snippet owners and `ON DELETE CASCADE` for sessions. Column widths are
//! enforced earlier, in `validation`.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{User, UserStore};
use crate::error::{AppError, AppResult};
use crate::session::{Session, SessionStore};
use crate::snippets::repo::SnippetStore;
use crate::snippets::repo_types::{Snippet, SnippetFields};

#[derive(Debug, Clone)]
struct SnippetRow {
    user_id: Option<i64>,
    fields: SnippetFields,
    created_at: OffsetDateTime,
}

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    next_user_id: i64,
    snippets: BTreeMap<i64, SnippetRow>,
    next_snippet_id: i64,
    sessions: HashMap<Uuid, Session>,
}

impl Inner {
    fn joined(&self, id: i64, row: &SnippetRow) -> Snippet {
        let username = row
            .user_id
            .and_then(|uid| self.users.get(&uid))
            .map(|u| u.username.clone());
        Snippet {
            id,
            user_id: row.user_id,
            title: row.fields.title.clone(),
            code: row.fields.code.clone(),
            description: row.fields.description.clone(),
            language: row.fields.language.clone(),
            created_at: row.created_at,
            username,
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a user the way the database would: owned snippets become
    /// anonymous and the user's sessions go away.
    #[cfg(test)]
    pub async fn remove_user(&self, id: i64) {
        let mut inner = self.inner.write().await;
        inner.users.remove(&id);
        for row in inner.snippets.values_mut() {
            if row.user_id == Some(id) {
                row.user_id = None;
            }
        }
        inner.sessions.retain(|_, s| s.user_id != id);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn create(&self, username: &str, password_hash: &str) -> AppResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.username == username) {
            return Err(AppError::Conflict("Username already exists".into()));
        }
        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            username: username.to_owned(),
            password_hash: password_hash.to_owned(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl SnippetStore for MemoryStore {
    async fn insert(&self, fields: &SnippetFields, owner: Option<i64>) -> AppResult<i64> {
        let mut inner = self.inner.write().await;
        // foreign key on user_id
        if let Some(uid) = owner {
            if !inner.users.contains_key(&uid) {
                return Err(AppError::Internal(format!("unknown owner {uid}")));
            }
        }
        inner.next_snippet_id += 1;
        let id = inner.next_snippet_id;
        inner.snippets.insert(
            id,
            SnippetRow {
                user_id: owner,
                fields: fields.clone(),
                created_at: OffsetDateTime::now_utc(),
            },
        );
        Ok(id)
    }

    async fn find(&self, id: i64) -> AppResult<Option<Snippet>> {
        let inner = self.inner.read().await;
        Ok(inner.snippets.get(&id).map(|row| inner.joined(id, row)))
    }

    async fn update(&self, id: i64, fields: &SnippetFields) -> AppResult<u64> {
        let mut inner = self.inner.write().await;
        match inner.snippets.get_mut(&id) {
            Some(row) => {
                row.fields = fields.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: i64) -> AppResult<u64> {
        let mut inner = self.inner.write().await;
        Ok(u64::from(inner.snippets.remove(&id).is_some()))
    }

    async fn search_title(&self, query: &str) -> AppResult<Vec<Snippet>> {
        let inner = self.inner.read().await;
        let needle = query.to_lowercase();
        Ok(inner
            .snippets
            .iter()
            .filter(|(_, row)| row.fields.title.to_lowercase().contains(&needle))
            .map(|(id, row)| inner.joined(*id, row))
            .collect())
    }

    async fn list_recent(&self) -> AppResult<Vec<Snippet>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<_> = inner
            .snippets
            .iter()
            .map(|(id, row)| inner.joined(*id, row))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, session: &Session) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Session>> {
        Ok(self.inner.read().await.sessions.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.inner.write().await.sessions.remove(&id);
        Ok(())
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> AppResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - inner.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn removing_owner_orphans_snippets_instead_of_deleting_them() {
        let store = MemoryStore::new();
        let alice = store.create("alice", "hash").await.unwrap();
        let fields = SnippetFields {
            title: "Hello".into(),
            code: "print(1)".into(),
            description: None,
            language: "python".into(),
        };
        let id = SnippetStore::insert(&store, &fields, Some(alice.id))
            .await
            .unwrap();

        store.remove_user(alice.id).await;

        let snippet = SnippetStore::find(&store, id).await.unwrap().unwrap();
        assert_eq!(snippet.user_id, None);
        assert_eq!(snippet.username, None);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let store = MemoryStore::new();
        store.create("alice", "a").await.unwrap();
        assert!(matches!(
            store.create("alice", "b").await.unwrap_err(),
            AppError::Conflict(_)
        ));
    }
}
