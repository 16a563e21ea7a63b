//! Error kinds shared by the services, the stores and the HTTP adapters.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Expired")]
    Expired,

    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Wrap a backend failure with the name of the operation that failed.
    pub fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        AppError::Storage(format!("{context}: {err}"))
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Duplicate(_) => (StatusCode::CONFLICT, "duplicate"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::Expired => (StatusCode::UNAUTHORIZED, "expired"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Unauthorized => (StatusCode::FORBIDDEN, "unauthorized"),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                let what = match db.constraint() {
                    Some(c) if c.contains("username") => "username",
                    Some(c) if c.contains("email") => "email",
                    _ => "record",
                };
                AppError::Duplicate(format!("{what} already exists"))
            }
            other => AppError::storage("database", other),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::storage("blocking task", e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            AppError::Storage(detail) => {
                tracing::error!(error = %detail, "storage failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(json!({ "error": code, "message": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Duplicate("x".into()), StatusCode::CONFLICT),
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AppError::Expired, StatusCode::UNAUTHORIZED),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::Unauthorized, StatusCode::FORBIDDEN),
            (AppError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn storage_error_keeps_context() {
        let err = AppError::storage("insert paste", "connection reset");
        assert_eq!(err.to_string(), "Storage error: insert paste: connection reset");
    }
}
