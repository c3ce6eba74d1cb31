use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::validation::FieldError;

/// Why a login attempt was declined. Kept distinct for logs; clients only
/// ever see "Invalid credentials".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Incorrect username")]
    UnknownUser,
    #[error("Incorrect password")]
    WrongPassword,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("no current user")]
    Identity,

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) | AppError::Identity => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that is safe to show to a client.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(errors) => summarize(errors),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Auth(_) => "Invalid credentials".into(),
            AppError::NotFound(what) => (*what).into(),
            AppError::Identity => "Not logged in".into(),
            AppError::Store(_) | AppError::Internal(_) => "Server error".into(),
        }
    }

    pub fn is_server_fault(&self) -> bool {
        matches!(self, AppError::Store(_) | AppError::Internal(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_server_fault() {
            error!(error = %self, "request failed");
        }
        let body = match &self {
            AppError::Validation(errors) => json!({ "errors": errors }),
            other => json!({ "error": other.public_message() }),
        };
        (status, Json(body)).into_response()
    }
}
