use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Seats {} are not available", .0.join(", "))]
    SeatsUnavailable(Vec<String>),

    #[error("Booking {0} is already cancelled")]
    AlreadyCancelled(Uuid),

    #[error("Invalid time range: end time must be after start time")]
    InvalidTimeRange,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("External sync failure: {0}")]
    ExternalSync(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SeatsUnavailable(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyCancelled(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidTimeRange => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            // A showtime with a dangling movie/theater reference is reported
            // as missing data, never booked against.
            AppError::DataIntegrity(_) => StatusCode::NOT_FOUND,
            AppError::ExternalSync(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::SeatsUnavailable(_) => "SEATS_UNAVAILABLE",
            AppError::AlreadyCancelled(_) => "ALREADY_CANCELLED",
            AppError::InvalidTimeRange => "INVALID_TIME_RANGE",
            AppError::Conflict(_) => "CONFLICT",
            AppError::DataIntegrity(_) => "DATA_INTEGRITY_ERROR",
            AppError::ExternalSync(_) => "EXTERNAL_SYNC_FAILURE",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
            other => {
                error!(error = ?other, code = other.code(), "Application error");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level messages to the client
        let public_message = match &self {
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            other => other.to_string(),
        };

        // Callers are told exactly which seats lost the race
        let details = match &self {
            AppError::SeatsUnavailable(seats) => Some(json!({ "seats": seats })),
            _ => None,
        };

        error_response(code, public_message, details, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seats_unavailable_lists_the_losing_seats() {
        let err = AppError::SeatsUnavailable(vec!["A1".into(), "B2".into()]);
        assert_eq!(err.to_string(), "Seats A1, B2 are not available");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "SEATS_UNAVAILABLE");
    }

    #[test]
    fn dangling_reference_surfaces_as_not_found() {
        let err = AppError::DataIntegrity("showtime references missing movie".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
