//! Maps domain and infrastructure errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use boxoffice_core::error::{AppError, ErrorKind};
use boxoffice_service::{BookingError, ErrorClass, WaitlistError};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Optional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Any error a handler can return.
#[derive(Debug)]
pub enum ApiError {
    App(AppError),
    Booking(BookingError),
    Waitlist(WaitlistError),
    Validation(ValidationErrors),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        Self::Booking(err)
    }
}

impl From<WaitlistError> for ApiError {
    fn from(err: WaitlistError) -> Self {
        Self::Waitlist(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        Self::Validation(err)
    }
}

/// HTTP status for a domain error code and class.
pub fn domain_status(code: &str, class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::Contention => StatusCode::CONFLICT,
        ErrorClass::Integrity | ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorClass::Business => match code {
            "DUPLICATE_BOOKING" | "ALREADY_ON_WAITLIST" => StatusCode::CONFLICT,
            "NOT_FOUND" | "NOT_ON_WAITLIST" => StatusCode::NOT_FOUND,
            c if c.ends_with("_NOT_FOUND") => StatusCode::NOT_FOUND,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        },
    }
}

fn app_status(err: &AppError) -> (StatusCode, &'static str) {
    match err.kind {
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
        ErrorKind::ServiceUnavailable | ErrorKind::Coordination => {
            (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::App(err) => {
                let (status, code) = app_status(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "Internal server error");
                }
                (
                    status,
                    ApiErrorResponse {
                        error: code.to_string(),
                        message: err.message,
                        details: None,
                    },
                )
            }
            Self::Booking(err) => {
                let status = domain_status(err.code(), err.class());
                if status.is_server_error() {
                    tracing::error!(error = %err, code = err.code(), "Booking failed");
                }
                let details = match &err {
                    BookingError::InsufficientSeats {
                        available,
                        requested,
                    } => Some(serde_json::json!({ "available": available, "requested": requested })),
                    _ if err.is_retryable() => Some(serde_json::json!({ "retryable": true })),
                    _ => None,
                };
                (
                    status,
                    ApiErrorResponse {
                        error: err.code().to_string(),
                        message: public_message(status, err.to_string()),
                        details,
                    },
                )
            }
            Self::Waitlist(err) => {
                let status = domain_status(err.code(), err.class());
                if status.is_server_error() {
                    tracing::error!(error = %err, code = err.code(), "Waitlist operation failed");
                }
                let details = match &err {
                    WaitlistError::SeatsAvailable { available } => {
                        Some(serde_json::json!({ "available": available }))
                    }
                    _ => None,
                };
                (
                    status,
                    ApiErrorResponse {
                        error: err.code().to_string(),
                        message: public_message(status, err.to_string()),
                        details,
                    },
                )
            }
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse {
                    error: "VALIDATION_ERROR".to_string(),
                    message: "Request validation failed".to_string(),
                    details: serde_json::to_value(&errors).ok(),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

fn public_message(status: StatusCode, message: String) -> String {
    if status.is_server_error() {
        "Internal server error".to_string()
    } else {
        message
    }
}
