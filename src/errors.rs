use crate::services::store_service::StoreError;
use crate::views;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

/// A lightweight wrapper for request errors that keeps the message local.
///
/// Handlers convert every `StoreError` into one of these; the response is
/// the rendered error page carrying the literal message text, never a raw
/// panic or debug dump.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Wrap a store failure with operation context, picking the HTTP status
    /// from the error's tag. Upstream failures map to 502 because this
    /// service is a gateway; only local spool I/O is a 500.
    pub fn from_store(context: impl fmt::Display, err: StoreError) -> Self {
        let status = match &err {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::AccessDenied(_) => StatusCode::FORBIDDEN,
            StoreError::BucketAlreadyExists(_) => StatusCode::CONFLICT,
            StoreError::InvalidBucketName { .. } | StoreError::InvalidObjectKey => {
                StatusCode::BAD_REQUEST
            }
            StoreError::Unreachable(_) | StoreError::Service(_) => StatusCode::BAD_GATEWAY,
            StoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, format!("{}: {}", context, err))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        views::error_page(self.status, &self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_differentiated_statuses() {
        let cases = [
            (StoreError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (
                StoreError::AccessDenied("nope".into()),
                StatusCode::FORBIDDEN,
            ),
            (
                StoreError::BucketAlreadyExists("dup".into()),
                StatusCode::CONFLICT,
            ),
            (
                StoreError::InvalidBucketName {
                    name: "AB".into(),
                    reason: "too short".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (StoreError::InvalidObjectKey, StatusCode::BAD_REQUEST),
            (
                StoreError::Unreachable("refused".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                StoreError::Service("oops".into()),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from_store("op failed", err).status, expected);
        }
    }

    #[test]
    fn message_keeps_context_and_store_text() {
        let err = AppError::from_store(
            "failed to list objects in bucket `demo`",
            StoreError::NotFound("The specified bucket does not exist".into()),
        );
        assert_eq!(
            err.message,
            "failed to list objects in bucket `demo`: not found: The specified bucket does not exist"
        );
    }
}
