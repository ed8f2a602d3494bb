use crate::services::{publish_service::PublishError, transform_service::TransformError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for invocation failures that keeps the message
/// local. The status code tells the invoking runtime whether the event is
/// worth re-delivering: 4xx is terminal input, 5xx may be retried as a
/// whole invocation.
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

    /// Shortcut for a 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
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
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<TransformError> for AppError {
    fn from(err: TransformError) -> Self {
        AppError::bad_request(err.to_string())
    }
}

impl From<PublishError> for AppError {
    fn from(err: PublishError) -> Self {
        let status = match &err {
            PublishError::TopicNotFound(_) => StatusCode::NOT_FOUND,
            PublishError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PublishError::Backend { .. } | PublishError::Publish { .. } => StatusCode::BAD_GATEWAY,
            PublishError::Cancelled(_) => StatusCode::GATEWAY_TIMEOUT,
        };
        AppError::new(status, err.to_string())
    }
}
