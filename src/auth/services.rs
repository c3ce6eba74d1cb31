use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::repo::UserStore;
use crate::auth::repo_types::User;
use crate::error::{AppError, AppResult, AuthError};
use crate::validation::FieldError;

/// Registration and credential checks over a [`UserStore`].
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Creates an account. Password length is the caller's concern.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> AppResult<()> {
        if password != confirm_password {
            return Err(AppError::Validation(vec![FieldError::new(
                "confirmPassword",
                "Passwords do not match",
            )]));
        }

        // Fast path only; the unique constraint decides races.
        if self.users.find_by_username(username).await?.is_some() {
            warn!(%username, "username already registered");
            return Err(AppError::Conflict("Username already exists".into()));
        }

        let hash = hash_password_blocking(password.to_owned()).await?;
        let user = self.users.create(username, &hash).await.map_err(|e| {
            if matches!(e, AppError::Conflict(_)) {
                warn!(%username, "username taken concurrently");
            }
            e
        })?;

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(())
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<User> {
        let Some(user) = self.users.find_by_username(username).await? else {
            warn!(%username, "login unknown username");
            return Err(AuthError::UnknownUser.into());
        };

        let ok = verify_password_blocking(password.to_owned(), user.password_hash.clone()).await?;
        if !ok {
            warn!(%username, user_id = user.id, "login invalid password");
            return Err(AuthError::WrongPassword.into());
        }

        info!(user_id = user.id, %username, "user authenticated");
        Ok(user)
    }
}
