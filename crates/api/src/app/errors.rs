use std::any::Any;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use ers_core::DomainError;

/// Message returned for every 5xx; details stay in the logs.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", err.to_string())
        }
        DomainError::DuplicateUsername => {
            json_error(StatusCode::BAD_REQUEST, "duplicate_username", err.to_string())
        }
        DomainError::DuplicateEmployeeId(_) => {
            json_error(StatusCode::BAD_REQUEST, "duplicate_employee_id", err.to_string())
        }
        DomainError::MissingManager => {
            json_error(StatusCode::BAD_REQUEST, "missing_manager", err.to_string())
        }
        DomainError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        DomainError::SameParty => json_error(StatusCode::BAD_REQUEST, "same_party", err.to_string()),
        DomainError::WrongManager(msg) => json_error(StatusCode::FORBIDDEN, "wrong_manager", msg),
        DomainError::InvalidTransition(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_transition", msg)
        }
        DomainError::OperationNotAllowed(msg) => {
            json_error(StatusCode::BAD_REQUEST, "operation_not_allowed", msg)
        }
        DomainError::ConcurrentModification(detail) => {
            tracing::info!(%detail, "concurrent modification");
            json_error(
                StatusCode::CONFLICT,
                "conflict",
                "The record was modified concurrently; reload and retry",
            )
        }
        DomainError::Validation { field, message } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "validation_error",
                "message": message,
                "field": field,
            })),
        )
            .into_response(),
        DomainError::Internal(detail) => {
            tracing::error!(%detail, "internal error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", INTERNAL_MESSAGE)
        }
    }
}

/// Handler error: a domain failure or a request the extractors refused.
#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    BadRequest(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::BadRequest(message) => {
                json_error(StatusCode::BAD_REQUEST, "validation_error", message)
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Body for a handler panic caught by `CatchPanicLayer`.
pub fn panic_to_response(panic: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    tracing::error!(detail, "handler panicked");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", INTERNAL_MESSAGE)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
