use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{User, UserStore};
use crate::error::{AppError, AppResult};
use crate::session::store::{Session, SessionStore};

/// Establishes, resolves and tears down session identities.
#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    ttl: Duration,
}

impl SessionService {
    pub fn new(sessions: Arc<dyn SessionStore>, users: Arc<dyn UserStore>, ttl: Duration) -> Self {
        Self {
            sessions,
            users,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Starts a session for `user`. A `previous` session is dropped first, so
    /// logging in again swaps the identity instead of stacking sessions.
    pub async fn login(&self, user: &User, previous: Option<Uuid>) -> AppResult<Session> {
        if let Some(old) = previous {
            self.sessions.delete(old).await?;
        }
        let session = Session {
            id: Uuid::new_v4(),
            user_id: user.id,
            expires_at: OffsetDateTime::now_utc() + self.ttl,
        };
        self.sessions.insert(&session).await?;
        info!(user_id = user.id, "session started");
        Ok(session)
    }

    /// Resolves a session to its user. Missing, expired and orphaned sessions
    /// all yield `AppError::Identity`.
    pub async fn current_user(&self, session_id: Uuid) -> AppResult<User> {
        let Some(session) = self.sessions.find(session_id).await? else {
            return Err(AppError::Identity);
        };
        if session.is_expired(OffsetDateTime::now_utc()) {
            debug!(user_id = session.user_id, "session expired");
            self.sessions.delete(session_id).await?;
            return Err(AppError::Identity);
        }
        self.users
            .find_by_id(session.user_id)
            .await?
            .ok_or(AppError::Identity)
    }

    pub async fn logout(&self, session_id: Uuid) -> AppResult<()> {
        self.sessions.delete(session_id).await?;
        debug!("session ended");
        Ok(())
    }

    pub async fn purge_expired(&self) -> AppResult<u64> {
        let purged = self
            .sessions
            .delete_expired(OffsetDateTime::now_utc())
            .await?;
        if purged > 0 {
            info!(purged, "expired sessions removed");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    async fn setup(ttl: Duration) -> (Arc<MemoryStore>, SessionService, User) {
        let store = Arc::new(MemoryStore::new());
        let user = store.create("alice", "hash").await.unwrap();
        let service = SessionService::new(store.clone(), store.clone(), ttl);
        (store, service, user)
    }

    #[tokio::test]
    async fn login_then_current_user_resolves() {
        let (_, sessions, user) = setup(Duration::minutes(5)).await;
        let session = sessions.login(&user, None).await.unwrap();
        let resolved = sessions.current_user(session.id).await.unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.username, "alice");
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let (_, sessions, user) = setup(Duration::minutes(5)).await;
        let session = sessions.login(&user, None).await.unwrap();
        sessions.logout(session.id).await.unwrap();
        sessions.logout(session.id).await.unwrap();
        sessions.logout(Uuid::new_v4()).await.unwrap();
        assert!(matches!(
            sessions.current_user(session.id).await.unwrap_err(),
            AppError::Identity
        ));
    }

    #[tokio::test]
    async fn relogin_replaces_previous_session() {
        let (store, sessions, alice) = setup(Duration::minutes(5)).await;
        let bob = store.create("bob", "hash").await.unwrap();

        let first = sessions.login(&alice, None).await.unwrap();
        let second = sessions.login(&bob, Some(first.id)).await.unwrap();

        assert!(sessions.current_user(first.id).await.is_err());
        assert_eq!(sessions.current_user(second.id).await.unwrap().username, "bob");
    }

    #[tokio::test]
    async fn expired_sessions_do_not_resolve_and_are_purged() {
        let (_, sessions, user) = setup(Duration::seconds(-1)).await;
        let stale = sessions.login(&user, None).await.unwrap();
        let other = sessions.login(&user, None).await.unwrap();

        assert!(matches!(
            sessions.current_user(stale.id).await.unwrap_err(),
            AppError::Identity
        ));
        // `stale` was dropped on lookup; only `other` is left to purge
        assert_eq!(sessions.purge_expired().await.unwrap(), 1);
        assert!(sessions.current_user(other.id).await.is_err());
    }

    #[tokio::test]
    async fn session_for_removed_user_is_no_identity() {
        let (store, sessions, user) = setup(Duration::minutes(5)).await;
        let session = sessions.login(&user, None).await.unwrap();
        store.remove_user(user.id).await;
        assert!(matches!(
            sessions.current_user(session.id).await.unwrap_err(),
            AppError::Identity
        ));
    }
}
