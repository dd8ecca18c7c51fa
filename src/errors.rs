use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Unified JSON error body returned by every failing endpoint.
#[derive(Serialize)]
pub struct ErrorResponse<'a> {
    pub code: &'a str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Upstream request error: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Backend is not configured")]
    NotConfigured,

    #[error("Internal server error")]
    Internal,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Upstream(_)
            | AppError::Backend(_)
            | AppError::Json(_)
            | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = self.code();
        let message = self.to_string();
        // trace_id travels on the x-request-id response header; the body slot
        // stays available for later correlation work.
        let body = ErrorResponse {
            code,
            message,
            details: None,
            trace_id: None,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Backend(_) => "BACKEND_ERROR",
            AppError::Json(_) => "JSON_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotConfigured => "NOT_CONFIGURED",
            AppError::Internal => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            AppError::NotConfigured.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Unauthorized("no session".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Backend("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(AppError::NotConfigured.code(), "NOT_CONFIGURED");
        assert_eq!(AppError::Internal.code(), "INTERNAL");
    }
}
