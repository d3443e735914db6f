//! Error types for web handlers.
//!
//! [`AppError`] bridges [`BookingError`] and HTTP: every domain failure keeps
//! its stable code and message and gets a fixed status. Responses are always
//! `{"code": ..., "message": ...}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use slotbook_core::BookingError;
use std::fmt;

/// Seconds a client should wait before retrying after a 503.
const RETRY_AFTER_SECONDS: u64 = 1;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(booking): State<Booking>) -> Result<Json<Message>, AppError> {
///     booking.claim(slot_id, &identity).await?;
///     Ok(Json(Message::new("Slot booked successfully")))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Seconds for the `Retry-After` header
    retry_after: Option<u64>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            retry_after: None,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Ask the client to retry after `seconds`.
    #[must_use]
    pub const fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHENTICATED".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
        .with_retry_after(RETRY_AFTER_SECONDS)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        let mut response = (self.status, Json(body)).into_response();
        if let Some(seconds) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let status = match &err {
            BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
            BookingError::AlreadyBooked(_) => StatusCode::CONFLICT,
            BookingError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            BookingError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            BookingError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            BookingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match err {
            // Store details stay in the logs.
            BookingError::Storage(_) => {
                Self::internal("An internal error occurred").with_source(anyhow::Error::new(err))
            }
            BookingError::Unavailable(_) => {
                Self::unavailable("Service temporarily unavailable, please retry")
                    .with_source(anyhow::Error::new(err))
            }
            _ => Self::new(status, err.to_string(), err.code().to_string()),
        }
    }
}

// Malformed input is a validation failure like any other.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        BookingError::Validation(rejection.body_text()).into()
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        BookingError::Validation(rejection.body_text()).into()
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        BookingError::Validation(rejection.body_text()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotbook_core::SlotId;

    #[test]
    fn test_error_display() {
        let err = AppError::unauthorized("Invalid token");
        assert_eq!(err.to_string(), "[UNAUTHENTICATED] Invalid token");
    }

    #[test]
    fn booking_errors_map_to_fixed_statuses() {
        let cases = [
            (BookingError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (BookingError::slot_not_found(SlotId::new(1)), StatusCode::NOT_FOUND),
            (BookingError::AlreadyBooked(SlotId::new(1)), StatusCode::CONFLICT),
            (BookingError::PermissionDenied("x".into()), StatusCode::FORBIDDEN),
            (BookingError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (BookingError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (BookingError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[test]
    fn domain_code_is_preserved() {
        let err = AppError::from(BookingError::AlreadyBooked(SlotId::new(9)));
        assert_eq!(err.code(), "ALREADY_BOOKED");
        assert_eq!(err.to_string(), "[ALREADY_BOOKED] Slot 9 is already booked");
    }

    #[test]
    fn unavailable_sets_retry_after() {
        let response = AppError::from(BookingError::Unavailable("deadlock".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let err = AppError::from(BookingError::Storage("relation missing".into()));
        assert!(!err.to_string().contains("relation"));
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
