//! Per-operation input checks. Each function returns every problem it finds
//! so forms can show them all at once.

use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Column widths from the schema; `VARCHAR(n)` counts characters.
pub const USERNAME_MAX_LEN: usize = 255;
pub const TITLE_MAX_LEN: usize = 255;
pub const LANGUAGE_MAX_LEN: usize = 50;

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn require(errors: &mut Vec<FieldError>, field: &'static str, value: &str, message: &str) {
    if is_blank(value) {
        errors.push(FieldError::new(field, message));
    }
}

fn cap(errors: &mut Vec<FieldError>, field: &'static str, value: &str, max: usize, label: &str) {
    if value.chars().count() > max {
        errors.push(FieldError::new(
            field,
            format!("{label} must be at most {max} characters long"),
        ));
    }
}

/// Turns a list of field errors into `Ok(())` or `AppError::Validation`.
pub fn into_result(errors: Vec<FieldError>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub fn validate_registration(
    username: &str,
    password: &str,
    confirm_password: &str,
    min_password_len: usize,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require(&mut errors, "username", username, "Username is required");
    cap(&mut errors, "username", username, USERNAME_MAX_LEN, "Username");
    if password.chars().count() < min_password_len {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {min_password_len} characters long"),
        ));
    }
    if password != confirm_password {
        errors.push(FieldError::new("confirmPassword", "Passwords do not match"));
    }
    errors
}

pub fn validate_login(username: &str, password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require(&mut errors, "username", username, "Username is required");
    require(&mut errors, "password", password, "Password is required");
    errors
}

pub fn validate_snippet(title: &str, code: &str, language: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require(&mut errors, "title", title, "Title is required");
    cap(&mut errors, "title", title, TITLE_MAX_LEN, "Title");
    require(&mut errors, "code", code, "Code is required");
    require(&mut errors, "language", language, "Language is required");
    cap(&mut errors, "language", language, LANGUAGE_MAX_LEN, "Language");
    errors
}

pub fn validate_search(query: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require(&mut errors, "query", query, "Search query is required");
    errors
}
