//! HTTP Error Handling
//!
//! 业务错误统一以 HTTP 200 + errno 返回

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const CONFLICT: i32 = 409;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    /// 当前故事状态不允许该操作（例如生成中翻页）
    Conflict(String),
    /// 生成服务不可用
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn errno(&self) -> i32 {
        match self {
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::Internal(_) => errno::INTERNAL_ERROR,
            ApiError::Conflict(_) => errno::CONFLICT,
            ApiError::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errno = self.errno();
        let msg = match self {
            ApiError::NotFound(msg) => {
                tracing::warn!(errno, error = %msg, "Resource not found");
                msg
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(errno, error = %msg, "Bad request");
                msg
            }
            ApiError::Conflict(msg) => {
                tracing::warn!(errno, error = %msg, "Story state conflict");
                msg
            }
            ApiError::Internal(msg) => {
                tracing::error!(errno, error = %msg, "Internal server error");
                msg
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(errno, error = %msg, "Generation service unavailable");
                msg
            }
        };

        (StatusCode::OK, Json(ErrorResponse::new(errno, msg))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { resource_type, id } => {
                ApiError::NotFound(format!("{} not found: {}", resource_type, id))
            }
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::InvalidState(msg) => ApiError::Conflict(msg),
            ApplicationError::SessionError(msg) | ApplicationError::GenerationError(msg) => {
                ApiError::ServiceUnavailable(msg)
            }
            ApplicationError::PlaybackError(msg) | ApplicationError::InternalError(msg) => {
                ApiError::Internal(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::story::{PageId, StoryError};

    #[test]
    fn test_application_error_mapping() {
        let not_found: ApiError = ApplicationError::from(StoryError::PageNotFound(PageId::new(2))).into();
        assert_eq!(not_found.errno(), errno::NOT_FOUND);

        let busy: ApiError = ApplicationError::from(StoryError::GenerationInProgress).into();
        assert_eq!(busy.errno(), errno::CONFLICT);

        let invalid: ApiError =
            ApplicationError::from(StoryError::InvalidDirection("up".to_string())).into();
        assert_eq!(invalid.errno(), errno::BAD_REQUEST);

        let down: ApiError = ApplicationError::GenerationError("quota".to_string()).into();
        assert_eq!(down.errno(), errno::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_error_body_uses_http_200() {
        let response = ApiError::Conflict("Story generation in progress".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["errno"], 409);
        assert_eq!(json["error"], "Story generation in progress");
        assert!(json["data"].is_null());
    }
}
