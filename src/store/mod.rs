use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{
    Booking, Movie, ResolvedBooking, Screen, Showtime, ShowtimeStatus, Theater, User,
};
use crate::utils::error::AppError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// All persistent domain state behind one seam. The Postgres backend is the
/// production one; the in-memory backend backs tests and doubles as the
/// reference implementation of the seat-versioning contract.
#[async_trait]
pub trait CinemaStore: Send + Sync {
    // Users
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    // Movies
    async fn insert_movie(&self, movie: &Movie) -> Result<(), AppError>;
    async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>, AppError>;
    async fn find_movie_by_title(&self, title: &str) -> Result<Option<Movie>, AppError>;

    // Theaters and screens
    async fn insert_theater(&self, theater: &Theater) -> Result<(), AppError>;
    async fn get_theater(&self, id: Uuid) -> Result<Option<Theater>, AppError>;
    /// Theaters eligible for showtime sync: `sync_enabled` with a non-null
    /// external cinema id.
    async fn list_sync_theaters(&self) -> Result<Vec<Theater>, AppError>;
    async fn insert_screen(&self, screen: &Screen) -> Result<(), AppError>;
    async fn list_screens(&self, theater_id: Uuid) -> Result<Vec<Screen>, AppError>;
    async fn get_screen(&self, id: Uuid) -> Result<Option<Screen>, AppError>;

    // Showtimes
    /// Fails with `Conflict` when another showtime already occupies the same
    /// (theater, screen, start_time) slot.
    async fn insert_showtime(&self, showtime: &Showtime) -> Result<(), AppError>;
    async fn get_showtime(&self, id: Uuid) -> Result<Option<Showtime>, AppError>;
    async fn list_showtimes(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Showtime>, AppError>;
    async fn showtime_exists(
        &self,
        theater_id: Uuid,
        movie_id: Uuid,
        start_time: DateTime<Utc>,
    ) -> Result<bool, AppError>;
    /// Conditional seat-set write: applies only if the stored version still
    /// equals `expected_version`, bumping it on success. Returns whether the
    /// write was applied; `false` means the caller lost a race and must
    /// reload before retrying.
    async fn update_showtime_seats(
        &self,
        id: Uuid,
        expected_version: i64,
        available_seats: Vec<String>,
        booked_seats: Vec<String>,
        status: ShowtimeStatus,
    ) -> Result<bool, AppError>;
    async fn update_showtime_times(
        &self,
        id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<(), AppError>;
    async fn update_showtime_pricing(
        &self,
        id: Uuid,
        price: Option<Decimal>,
        premium_seats: Option<Vec<String>>,
    ) -> Result<(), AppError>;

    // Bookings
    async fn insert_booking(&self, booking: &Booking) -> Result<(), AppError>;
    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, AppError>;
    async fn mark_booking_cancelled(
        &self,
        id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AppError>;
    /// Newest first.
    async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError>;
    async fn list_bookings(&self) -> Result<Vec<Booking>, AppError>;
    async fn list_confirmed_for_showtime(
        &self,
        showtime_id: Uuid,
    ) -> Result<Vec<Booking>, AppError>;
    /// Confirmed bookings whose showtime has not started yet; drives reminder
    /// reconstruction after a restart.
    async fn list_confirmed_upcoming(&self, now: DateTime<Utc>)
        -> Result<Vec<Booking>, AppError>;
    /// Booking with every reference resolved, for the notifier. A missing
    /// referent is a `DataIntegrity` error, a missing booking is `None`.
    async fn resolve_booking(&self, id: Uuid) -> Result<Option<ResolvedBooking>, AppError>;
}
