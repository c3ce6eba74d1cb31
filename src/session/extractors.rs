use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::auth::User;
use crate::error::AppError;
use crate::session::cookie;
use crate::state::AppState;

/// The session cookie and the identity it resolves to. Missing, stale or
/// orphaned sessions give `user: None`; only store failures reject.
pub struct MaybeUser {
    pub session: Option<Uuid>,
    pub user: Option<User>,
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = cookie::session_id(&parts.headers);
        let user = match session {
            None => None,
            Some(id) => match state.sessions.current_user(id).await {
                Ok(user) => Some(user),
                Err(AppError::Identity) => None,
                Err(e) => return Err(e),
            },
        };
        Ok(Self { session, user })
    }
}

/// Requires a logged-in user; rejects with 401 otherwise.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser { user, .. } = MaybeUser::from_request_parts(parts, state).await?;
        user.map(CurrentUser).ok_or(AppError::Identity)
    }
}
