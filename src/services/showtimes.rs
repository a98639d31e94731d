use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{SeatMap, Showtime, ShowtimeStatus};
use crate::store::CinemaStore;
use crate::utils::error::AppError;

#[derive(Debug, Clone)]
pub struct NewShowtime {
    pub movie_id: Uuid,
    pub theater_id: Uuid,
    pub screen_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price: Decimal,
}

/// Admin-side showtime management: creation with a freshly materialized seat
/// universe, listing, and repricing. Seat state itself belongs to the
/// booking engine.
pub struct ShowtimeService {
    store: Arc<dyn CinemaStore>,
}

impl ShowtimeService {
    pub fn new(store: Arc<dyn CinemaStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, req: NewShowtime) -> Result<Showtime, AppError> {
        if req.end_time <= req.start_time {
            return Err(AppError::InvalidTimeRange);
        }
        if self.store.get_movie(req.movie_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Movie {} not found",
                req.movie_id
            )));
        }
        if self.store.get_theater(req.theater_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Theater {} not found",
                req.theater_id
            )));
        }
        let screen = self
            .store
            .get_screen(req.screen_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Screen {} not found", req.screen_id)))?;
        if screen.theater_id != req.theater_id {
            return Err(AppError::ValidationError(
                "Screen does not belong to the given theater".to_string(),
            ));
        }

        let seat_map = SeatMap::fresh_grid(
            screen.seat_rows as u32,
            screen.seat_columns as u32,
            screen.premium_seats.clone(),
        );
        let showtime = Showtime {
            id: Uuid::new_v4(),
            movie_id: req.movie_id,
            theater_id: req.theater_id,
            screen_id: req.screen_id,
            start_time: req.start_time,
            end_time: req.end_time,
            price: req.price,
            total_seats: seat_map.total_seats(),
            seats_per_row: screen.seat_columns,
            available_seats: seat_map.available_seats(),
            booked_seats: Vec::new(),
            premium_seats: screen.premium_seats.clone(),
            status: ShowtimeStatus::Available,
            version: 0,
            created_at: Utc::now(),
        };
        self.store.insert_showtime(&showtime).await?;
        Ok(showtime)
    }

    pub async fn list(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Showtime>, AppError> {
        self.store.list_showtimes(from, to).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Showtime, AppError> {
        self.store
            .get_showtime(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Showtime {id} not found")))
    }

    /// Repricing never touches existing bookings; their totals were fixed at
    /// booking time.
    pub async fn reprice(
        &self,
        id: Uuid,
        price: Option<Decimal>,
        premium_seats: Option<Vec<String>>,
    ) -> Result<Showtime, AppError> {
        if price.is_none() && premium_seats.is_none() {
            return Err(AppError::ValidationError(
                "Nothing to update: provide price and/or premiumSeats".to_string(),
            ));
        }
        self.store
            .update_showtime_pricing(id, price, premium_seats)
            .await?;
        self.get(id).await
    }
}
