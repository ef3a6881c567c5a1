//! Top-level API error: renders the JSON error envelope every handler
//! returns on failure (spec.md §6) and classifies failures into the named
//! codes a client branches on.

use autolot_core::{Error as CoreError, ErrorKind};
use autolot_nlu::{GuardrailVerdict, ViolationCategory};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    SessionNotFound,
    SessionBlocked,
    OffTopic,
    Pii,
    Extraction,
    Injection,
    Profanity,
    RateLimit,
    InternalError,
}

impl ErrorCode {
    fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::OffTopic
            | ErrorCode::Pii
            | ErrorCode::Extraction
            | ErrorCode::Injection
            | ErrorCode::Profanity => StatusCode::BAD_REQUEST,
            ErrorCode::SessionNotFound => StatusCode::NOT_FOUND,
            ErrorCode::SessionBlocked => StatusCode::FORBIDDEN,
            ErrorCode::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn session_not_found() -> Self {
        Self::new(ErrorCode::SessionNotFound, "session not found or expired")
    }

    /// Maps a `Block`/`Warn` guardrail verdict to the matching error code.
    /// Only called once the caller has confirmed `verdict.is_blocked()`.
    pub fn from_guardrail(verdict: &GuardrailVerdict) -> Self {
        let category = verdict.category.unwrap_or(ViolationCategory::InputInvalid);
        let code = match category {
            ViolationCategory::OffTopic => ErrorCode::OffTopic,
            ViolationCategory::Pii => ErrorCode::Pii,
            ViolationCategory::BulkExtraction => ErrorCode::Extraction,
            ViolationCategory::Injection => ErrorCode::Injection,
            ViolationCategory::Profanity => ErrorCode::Profanity,
            ViolationCategory::RateLimit => ErrorCode::RateLimit,
            ViolationCategory::InputInvalid => ErrorCode::ValidationError,
        };
        let message = verdict.message.clone().unwrap_or_else(|| "request rejected".to_string());
        let mut error = Self::new(code, message);
        if let Some(retry_after) = verdict.retry_after {
            error = error.with_details(serde_json::json!({ "retryAfterSecs": retry_after.num_seconds() }));
        }
        error
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match (&err, err.kind()) {
            (CoreError::SessionNotFound, _) => ErrorCode::SessionNotFound,
            (CoreError::InvalidInput(_) | CoreError::Guardrail(_), _) => ErrorCode::ValidationError,
            (_, ErrorKind::User) => ErrorCode::ValidationError,
            (_, ErrorKind::TransientDependency | ErrorKind::PermanentDependency | ErrorKind::InternalInvariantViolation) => {
                ErrorCode::InternalError
            }
        };
        Self::new(code, err.to_string())
    }
}

impl From<autolot_query::QueryError> for ApiError {
    fn from(err: autolot_query::QueryError) -> Self {
        Self::from(CoreError::from(err))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
    timestamp: String,
    #[serde(rename = "traceId")]
    trace_id: String,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if matches!(self.code, ErrorCode::InternalError) {
            tracing::error!(message = %self.message, "internal error");
        }
        let body = ErrorBody {
            error: ErrorDetail { code: self.code, message: self.message, details: self.details },
            timestamp: chrono::Utc::now().to_rfc3339(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
