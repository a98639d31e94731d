use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::PaymentMethod;
use crate::services::NewBooking;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

/// Identity is established upstream; the auth layer forwards the caller as a
/// header.
pub fn require_user_id(headers: &HeaderMap) -> Result<Uuid, AppError> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::AuthError("Missing X-User-Id header".to_string()))?
        .parse()
        .map_err(|_| AppError::AuthError("Invalid X-User-Id header".to_string()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub showtime_id: Uuid,
    pub seats: Vec<String>,
    pub payment_method: PaymentMethod,
    /// Confirmation token from the payment provider, when payment already
    /// completed client-side.
    pub payment_ref: Option<String>,
}

pub async fn create_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateBookingRequest>,
) -> Result<Response, AppError> {
    let user_id = require_user_id(&headers)?;
    let booking = state
        .bookings
        .create_booking(NewBooking {
            user_id,
            showtime_id: req.showtime_id,
            seats: req.seats,
            payment_method: req.payment_method,
            payment_ref: req.payment_ref,
        })
        .await?;
    Ok(created(booking, "Booking created"))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CancelBookingRequest {
    pub cancellation_reason: Option<String>,
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<CancelBookingRequest>,
) -> Result<Response, AppError> {
    let user_id = require_user_id(&headers)?;
    let booking = state
        .bookings
        .cancel_booking(id, user_id, req.cancellation_reason)
        .await?;
    Ok(success(booking, "Booking cancelled successfully"))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let user_id = require_user_id(&headers)?;
    let booking = state.bookings.get_booking_for(id, user_id).await?;
    Ok(success(booking, "Booking fetched"))
}

pub async fn my_bookings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let user_id = require_user_id(&headers)?;
    let bookings = state.bookings.list_user_bookings(user_id).await?;
    Ok(success(bookings, "Bookings fetched"))
}

/// Operational listing of every booking, newest first.
pub async fn list_bookings(State(state): State<AppState>) -> Result<Response, AppError> {
    let bookings = state.bookings.list_all_bookings().await?;
    Ok(success(bookings, "Bookings fetched"))
}
