use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::seat_map::SeatMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "showtime_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ShowtimeStatus {
    Available,
    Full,
    Archived,
}

/// A scheduled screening with its seat inventory. The seat sets are only
/// ever written through a version-conditioned update; `version` is bumped on
/// every successful seat mutation so concurrent bookings against the same
/// showtime cannot both win.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Showtime {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub theater_id: Uuid,
    pub screen_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price: Decimal,
    pub total_seats: i32,
    pub seats_per_row: i32,
    pub available_seats: Vec<String>,
    pub booked_seats: Vec<String>,
    pub premium_seats: Vec<String>,
    pub status: ShowtimeStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Showtime {
    pub fn seat_map(&self) -> SeatMap {
        SeatMap::new(
            self.available_seats.clone(),
            self.booked_seats.clone(),
            self.premium_seats.clone(),
            self.total_seats,
        )
    }
}
