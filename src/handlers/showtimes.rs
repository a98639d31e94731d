use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::services::NewShowtime;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShowtimeRequest {
    pub movie_id: Uuid,
    pub theater_id: Uuid,
    pub screen_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price: Decimal,
}

pub async fn create_showtime(
    State(state): State<AppState>,
    Json(req): Json<CreateShowtimeRequest>,
) -> Result<Response, AppError> {
    let showtime = state
        .showtimes
        .create(NewShowtime {
            movie_id: req.movie_id,
            theater_id: req.theater_id,
            screen_id: req.screen_id,
            start_time: req.start_time,
            end_time: req.end_time,
            price: req.price,
        })
        .await?;
    Ok(created(showtime, "Showtime created"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListShowtimesQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

pub async fn list_showtimes(
    State(state): State<AppState>,
    Query(query): Query<ListShowtimesQuery>,
) -> Result<Response, AppError> {
    let showtimes = state
        .showtimes
        .list(query.start_date, query.end_date)
        .await?;
    Ok(success(showtimes, "Showtimes fetched"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepriceShowtimeRequest {
    pub price: Option<Decimal>,
    pub premium_seats: Option<Vec<String>>,
}

pub async fn reprice_showtime(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RepriceShowtimeRequest>,
) -> Result<Response, AppError> {
    let showtime = state
        .showtimes
        .reprice(id, req.price, req.premium_seats)
        .await?;
    Ok(success(showtime, "Showtime pricing updated"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleShowtimeRequest {
    pub new_start_time: DateTime<Utc>,
    pub new_end_time: DateTime<Utc>,
}

pub async fn reschedule_showtime(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RescheduleShowtimeRequest>,
) -> Result<Response, AppError> {
    let notified = state
        .bookings
        .reschedule_showtime(id, req.new_start_time, req.new_end_time)
        .await?;
    Ok(success(
        json!({ "notified": notified }),
        format!("Showtime rescheduled successfully. {notified} users notified."),
    ))
}
