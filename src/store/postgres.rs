use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    Booking, BookingStatus, Movie, ResolvedBooking, Screen, Showtime, ShowtimeStatus, Theater,
    User,
};
use crate::utils::error::AppError;

use super::CinemaStore;

/// Postgres backend. Seat mutations ride on a version-conditioned UPDATE and
/// duplicate showtime slots are rejected by the unique constraint, so neither
/// race depends on application-side locking.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::DatabaseError(err),
    }
}

#[async_trait]
impl CinemaStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (id, name, email, phone, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.phone.clone())
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_movie(&self, movie: &Movie) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO movies (id, title, description, genres, duration_mins, release_date, \
             poster_url, backdrop_url, rating, languages, formats, release_status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(movie.id)
        .bind(&movie.title)
        .bind(&movie.description)
        .bind(movie.genres.clone())
        .bind(movie.duration_mins)
        .bind(movie.release_date)
        .bind(movie.poster_url.clone())
        .bind(movie.backdrop_url.clone())
        .bind(movie.rating)
        .bind(movie.languages.clone())
        .bind(movie.formats.clone())
        .bind(movie.release_status)
        .bind(movie.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>, AppError> {
        let movie = sqlx::query_as::<_, Movie>("SELECT * FROM movies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(movie)
    }

    async fn find_movie_by_title(&self, title: &str) -> Result<Option<Movie>, AppError> {
        let movie =
            sqlx::query_as::<_, Movie>("SELECT * FROM movies WHERE title = $1 LIMIT 1")
                .bind(title)
                .fetch_optional(&self.pool)
                .await?;
        Ok(movie)
    }

    async fn insert_theater(&self, theater: &Theater) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO theaters (id, name, city, address, phone_number, external_cinema_id, \
             sync_enabled, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(theater.id)
        .bind(&theater.name)
        .bind(&theater.city)
        .bind(&theater.address)
        .bind(theater.phone_number.clone())
        .bind(theater.external_cinema_id.clone())
        .bind(theater.sync_enabled)
        .bind(theater.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_theater(&self, id: Uuid) -> Result<Option<Theater>, AppError> {
        let theater = sqlx::query_as::<_, Theater>("SELECT * FROM theaters WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(theater)
    }

    async fn list_sync_theaters(&self) -> Result<Vec<Theater>, AppError> {
        let theaters = sqlx::query_as::<_, Theater>(
            "SELECT * FROM theaters \
             WHERE sync_enabled AND external_cinema_id IS NOT NULL \
             ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(theaters)
    }

    async fn insert_screen(&self, screen: &Screen) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO screens (id, theater_id, screen_number, format, seat_rows, \
             seat_columns, premium_seats, total_seats, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(screen.id)
        .bind(screen.theater_id)
        .bind(screen.screen_number)
        .bind(&screen.format)
        .bind(screen.seat_rows)
        .bind(screen.seat_columns)
        .bind(screen.premium_seats.clone())
        .bind(screen.total_seats)
        .bind(screen.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_screens(&self, theater_id: Uuid) -> Result<Vec<Screen>, AppError> {
        let screens = sqlx::query_as::<_, Screen>(
            "SELECT * FROM screens WHERE theater_id = $1 ORDER BY screen_number",
        )
        .bind(theater_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(screens)
    }

    async fn get_screen(&self, id: Uuid) -> Result<Option<Screen>, AppError> {
        let screen = sqlx::query_as::<_, Screen>("SELECT * FROM screens WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(screen)
    }

    async fn insert_showtime(&self, showtime: &Showtime) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO showtimes (id, movie_id, theater_id, screen_id, start_time, end_time, \
             price, total_seats, seats_per_row, available_seats, booked_seats, premium_seats, \
             status, version, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(showtime.id)
        .bind(showtime.movie_id)
        .bind(showtime.theater_id)
        .bind(showtime.screen_id)
        .bind(showtime.start_time)
        .bind(showtime.end_time)
        .bind(showtime.price)
        .bind(showtime.total_seats)
        .bind(showtime.seats_per_row)
        .bind(showtime.available_seats.clone())
        .bind(showtime.booked_seats.clone())
        .bind(showtime.premium_seats.clone())
        .bind(showtime.status)
        .bind(showtime.version)
        .bind(showtime.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, "a showtime already occupies this screen and start time")
        })?;
        Ok(())
    }

    async fn get_showtime(&self, id: Uuid) -> Result<Option<Showtime>, AppError> {
        let showtime = sqlx::query_as::<_, Showtime>("SELECT * FROM showtimes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(showtime)
    }

    async fn list_showtimes(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Showtime>, AppError> {
        let showtimes = sqlx::query_as::<_, Showtime>(
            "SELECT * FROM showtimes \
             WHERE ($1::timestamptz IS NULL OR start_time >= $1) \
               AND ($2::timestamptz IS NULL OR start_time <= $2) \
             ORDER BY start_time",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(showtimes)
    }

    async fn showtime_exists(
        &self,
        theater_id: Uuid,
        movie_id: Uuid,
        start_time: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM showtimes \
             WHERE theater_id = $1 AND movie_id = $2 AND start_time = $3)",
        )
        .bind(theater_id)
        .bind(movie_id)
        .bind(start_time)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn update_showtime_seats(
        &self,
        id: Uuid,
        expected_version: i64,
        available_seats: Vec<String>,
        booked_seats: Vec<String>,
        status: ShowtimeStatus,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE showtimes \
             SET available_seats = $2, booked_seats = $3, status = $4, version = version + 1 \
             WHERE id = $1 AND version = $5",
        )
        .bind(id)
        .bind(available_seats)
        .bind(booked_seats)
        .bind(status)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_showtime_times(
        &self,
        id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE showtimes SET start_time = $2, end_time = $3 WHERE id = $1")
                .bind(id)
                .bind(start_time)
                .bind(end_time)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Showtime {id} not found")));
        }
        Ok(())
    }

    async fn update_showtime_pricing(
        &self,
        id: Uuid,
        price: Option<Decimal>,
        premium_seats: Option<Vec<String>>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE showtimes \
             SET price = COALESCE($2, price), \
                 premium_seats = COALESCE($3, premium_seats) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(price)
        .bind(premium_seats)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Showtime {id} not found")));
        }
        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO bookings (id, user_id, showtime_id, movie_id, theater_id, seats, \
             number_of_tickets, total_amount, payment_method, payment_ref, payment_status, \
             booking_status, booking_reference, cancellation_reason, cancellation_date, \
             created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.showtime_id)
        .bind(booking.movie_id)
        .bind(booking.theater_id)
        .bind(booking.seats.clone())
        .bind(booking.number_of_tickets)
        .bind(booking.total_amount)
        .bind(booking.payment_method)
        .bind(booking.payment_ref.clone())
        .bind(booking.payment_status)
        .bind(booking.booking_status)
        .bind(&booking.booking_reference)
        .bind(booking.cancellation_reason.clone())
        .bind(booking.cancellation_date)
        .bind(booking.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "booking reference already exists"))?;
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(booking)
    }

    async fn mark_booking_cancelled(
        &self,
        id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE bookings \
             SET booking_status = $2, cancellation_reason = $3, cancellation_date = $4 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(BookingStatus::Cancelled)
        .bind(reason)
        .bind(at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Booking {id} not found")));
        }
        Ok(())
    }

    async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, AppError> {
        let bookings =
            sqlx::query_as::<_, Booking>("SELECT * FROM bookings ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(bookings)
    }

    async fn list_confirmed_for_showtime(
        &self,
        showtime_id: Uuid,
    ) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE showtime_id = $1 AND booking_status = $2",
        )
        .bind(showtime_id)
        .bind(BookingStatus::Confirmed)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    async fn list_confirmed_upcoming(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT b.* FROM bookings b \
             JOIN showtimes s ON s.id = b.showtime_id \
             WHERE b.booking_status = $1 AND s.start_time > $2",
        )
        .bind(BookingStatus::Confirmed)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    async fn resolve_booking(&self, id: Uuid) -> Result<Option<ResolvedBooking>, AppError> {
        let Some(booking) = self.get_booking(id).await? else {
            return Ok(None);
        };

        let user = self.get_user(booking.user_id).await?.ok_or_else(|| {
            AppError::DataIntegrity(format!("booking {id} references missing user"))
        })?;
        let movie = self.get_movie(booking.movie_id).await?.ok_or_else(|| {
            AppError::DataIntegrity(format!("booking {id} references missing movie"))
        })?;
        let showtime = self.get_showtime(booking.showtime_id).await?.ok_or_else(|| {
            AppError::DataIntegrity(format!("booking {id} references missing showtime"))
        })?;
        let theater = self.get_theater(booking.theater_id).await?.ok_or_else(|| {
            AppError::DataIntegrity(format!("booking {id} references missing theater"))
        })?;

        Ok(Some(ResolvedBooking {
            booking,
            user,
            movie,
            showtime,
            theater,
        }))
    }
}
