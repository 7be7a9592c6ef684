use crate::errors::AppError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// JSON error body `{"error": "..."}` with its status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Request-level errors keep their own status and text; anything else
/// becomes a 500 carrying the handler's fixed message.
pub trait OrFail<T> {
    fn or_fail(self, message: &str) -> ApiResult<T>;
}

impl<T> OrFail<T> for Result<T, AppError> {
    fn or_fail(self, message: &str) -> ApiResult<T> {
        self.map_err(|e| match e {
            AppError::BadRequest(m) | AppError::InvalidDate(m) | AppError::InvalidRole(m) => ApiError::bad_request(m),
            AppError::Unauthorized(m) => ApiError::unauthorized(m),
            AppError::Forbidden(m) => ApiError::new(StatusCode::FORBIDDEN, m),
            AppError::NotFound(m) => ApiError::not_found(m),
            other => {
                tracing::error!(error = %other, "{message}");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_behind_the_fixed_message() {
        let r: Result<(), AppError> = Err(AppError::Other("disk on fire".into()));
        let e = r.or_fail("Failed to fetch users").unwrap_err();
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.message, "Failed to fetch users");
    }

    #[test]
    fn request_errors_keep_their_status() {
        let r: Result<(), AppError> = Err(AppError::BadRequest("No drives specified".into()));
        let e = r.or_fail("Failed to destroy drives").unwrap_err();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.message, "No drives specified");
    }
}
