//! # API Error
//!
//! Single boundary that turns every failure raised by extractors, middleware
//! and handlers into the `{"message": ...}` envelope the frontend expects.

use axum::Json;
use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::database::StoreError;

/// Client-visible message for every 401.
pub const UNAUTHORIZED_MESSAGE: &str = "Authorization required";

/// Client-visible message for every 500. The real cause only goes to the log.
pub const INTERNAL_MESSAGE: &str = "An error occurred on the server";

#[derive(Error, Debug)]
pub enum ApiError {
    /// Request payload or path failed schema checks. One entry per violation.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("unauthorized")]
    Unauthorized,

    /// Credentials were checked and rejected (sign-in).
    #[error("bad credentials: {0}")]
    BadCredentials(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(vec![message.into()])
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::BadCredentials(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that is safe to show to the client.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Validation(violations) => violations.join("; "),
            ApiError::Unauthorized => UNAUTHORIZED_MESSAGE.to_string(),
            ApiError::BadCredentials(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(cause) => {
                tracing::error!("[ApiError] internal failure: {:#}", cause);
            }
            other => {
                tracing::debug!("[ApiError] {} -> {}", other, status.as_u16());
            }
        }

        (status, Json(json!({ "message": self.client_message() }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(email) => {
                ApiError::Conflict(format!("User with email {email} already exists"))
            }
            StoreError::Backend(cause) => ApiError::Internal(cause),
        }
    }
}

/// Lets handlers take `WithRejection<Path<Uuid>, ApiError>`, so a malformed id
/// is a 400 in the usual envelope rather than axum's plain-text rejection.
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_failure_kind() {
        assert_eq!(ApiError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::not_found("card").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("dup".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_cause_is_masked() {
        let err = ApiError::Internal(anyhow::anyhow!("connection refused to 10.0.0.3"));
        assert_eq!(err.client_message(), INTERNAL_MESSAGE);
    }

    #[test]
    fn validation_messages_are_joined() {
        let err = ApiError::Validation(vec![
            "\"email\" is required".into(),
            "\"password\" is required".into(),
        ]);
        assert_eq!(err.client_message(), "\"email\" is required; \"password\" is required");
    }

    #[test]
    fn duplicate_email_becomes_conflict() {
        let err: ApiError = StoreError::DuplicateEmail("a@b.com".into()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(err.client_message().contains("a@b.com"));
    }
}
