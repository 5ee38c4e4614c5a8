use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure of a fetch or load run. Every variant is terminal for the invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Store I/O error: {0}")]
    StoreIo(String),

    #[error("Destination error: {0}")]
    Destination(#[from] sqlx::Error),
}

impl PipelineError {
    /// Process exit code reported by the `fetch` and `load` binaries.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Validation(_) => 2,
            PipelineError::Fetch(_) => 3,
            PipelineError::StoreIo(_) => 4,
            PipelineError::Destination(_) => 5,
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        PipelineError::Fetch(e.to_string())
    }
}

/// Read API error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_and_non_zero() {
        let codes = [
            PipelineError::Validation("bad".into()).exit_code(),
            PipelineError::Fetch("down".into()).exit_code(),
            PipelineError::StoreIo("disk".into()).exit_code(),
            PipelineError::Destination(sqlx::Error::RowNotFound).exit_code(),
        ];
        assert!(codes.iter().all(|c| *c != 0));
        for (i, a) in codes.iter().enumerate() {
            assert!(codes[i + 1..].iter().all(|b| b != a));
        }
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = AppError::Validation("Invalid date".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_database_error_is_masked_as_500() {
        let response = AppError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
