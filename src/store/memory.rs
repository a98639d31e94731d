use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{
    Booking, BookingStatus, Movie, ResolvedBooking, Screen, Showtime, ShowtimeStatus, Theater,
    User,
};
use crate::utils::error::AppError;

use super::CinemaStore;

/// In-memory backend. Lock scope never spans an await, so the seat-version
/// check-and-swap is atomic under the write lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    movies: HashMap<Uuid, Movie>,
    theaters: HashMap<Uuid, Theater>,
    screens: HashMap<Uuid, Screen>,
    showtimes: HashMap<Uuid, Showtime>,
    bookings: HashMap<Uuid, Booking>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CinemaStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        self.inner
            .write()
            .unwrap()
            .users
            .insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.inner.read().unwrap().users.get(&id).cloned())
    }

    async fn insert_movie(&self, movie: &Movie) -> Result<(), AppError> {
        self.inner
            .write()
            .unwrap()
            .movies
            .insert(movie.id, movie.clone());
        Ok(())
    }

    async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>, AppError> {
        Ok(self.inner.read().unwrap().movies.get(&id).cloned())
    }

    async fn find_movie_by_title(&self, title: &str) -> Result<Option<Movie>, AppError> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .movies
            .values()
            .find(|m| m.title == title)
            .cloned())
    }

    async fn insert_theater(&self, theater: &Theater) -> Result<(), AppError> {
        self.inner
            .write()
            .unwrap()
            .theaters
            .insert(theater.id, theater.clone());
        Ok(())
    }

    async fn get_theater(&self, id: Uuid) -> Result<Option<Theater>, AppError> {
        Ok(self.inner.read().unwrap().theaters.get(&id).cloned())
    }

    async fn list_sync_theaters(&self) -> Result<Vec<Theater>, AppError> {
        let mut theaters: Vec<Theater> = self
            .inner
            .read()
            .unwrap()
            .theaters
            .values()
            .filter(|t| t.sync_enabled && t.external_cinema_id.is_some())
            .cloned()
            .collect();
        theaters.sort_by_key(|t| t.created_at);
        Ok(theaters)
    }

    async fn insert_screen(&self, screen: &Screen) -> Result<(), AppError> {
        self.inner
            .write()
            .unwrap()
            .screens
            .insert(screen.id, screen.clone());
        Ok(())
    }

    async fn list_screens(&self, theater_id: Uuid) -> Result<Vec<Screen>, AppError> {
        let mut screens: Vec<Screen> = self
            .inner
            .read()
            .unwrap()
            .screens
            .values()
            .filter(|s| s.theater_id == theater_id)
            .cloned()
            .collect();
        screens.sort_by_key(|s| s.screen_number);
        Ok(screens)
    }

    async fn get_screen(&self, id: Uuid) -> Result<Option<Screen>, AppError> {
        Ok(self.inner.read().unwrap().screens.get(&id).cloned())
    }

    async fn insert_showtime(&self, showtime: &Showtime) -> Result<(), AppError> {
        let mut inner = self.inner.write().unwrap();
        let slot_taken = inner.showtimes.values().any(|s| {
            s.theater_id == showtime.theater_id
                && s.screen_id == showtime.screen_id
                && s.start_time == showtime.start_time
        });
        if slot_taken {
            return Err(AppError::Conflict(
                "a showtime already occupies this screen and start time".to_string(),
            ));
        }
        inner.showtimes.insert(showtime.id, showtime.clone());
        Ok(())
    }

    async fn get_showtime(&self, id: Uuid) -> Result<Option<Showtime>, AppError> {
        Ok(self.inner.read().unwrap().showtimes.get(&id).cloned())
    }

    async fn list_showtimes(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Showtime>, AppError> {
        let mut showtimes: Vec<Showtime> = self
            .inner
            .read()
            .unwrap()
            .showtimes
            .values()
            .filter(|s| from.map_or(true, |f| s.start_time >= f))
            .filter(|s| to.map_or(true, |t| s.start_time <= t))
            .cloned()
            .collect();
        showtimes.sort_by_key(|s| s.start_time);
        Ok(showtimes)
    }

    async fn showtime_exists(
        &self,
        theater_id: Uuid,
        movie_id: Uuid,
        start_time: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        Ok(self.inner.read().unwrap().showtimes.values().any(|s| {
            s.theater_id == theater_id && s.movie_id == movie_id && s.start_time == start_time
        }))
    }

    async fn update_showtime_seats(
        &self,
        id: Uuid,
        expected_version: i64,
        available_seats: Vec<String>,
        booked_seats: Vec<String>,
        status: ShowtimeStatus,
    ) -> Result<bool, AppError> {
        let mut inner = self.inner.write().unwrap();
        let showtime = inner
            .showtimes
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Showtime {id} not found")))?;

        if showtime.version != expected_version {
            return Ok(false);
        }
        showtime.available_seats = available_seats;
        showtime.booked_seats = booked_seats;
        showtime.status = status;
        showtime.version += 1;
        Ok(true)
    }

    async fn update_showtime_times(
        &self,
        id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write().unwrap();
        let showtime = inner
            .showtimes
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Showtime {id} not found")))?;
        showtime.start_time = start_time;
        showtime.end_time = end_time;
        Ok(())
    }

    async fn update_showtime_pricing(
        &self,
        id: Uuid,
        price: Option<Decimal>,
        premium_seats: Option<Vec<String>>,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write().unwrap();
        let showtime = inner
            .showtimes
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Showtime {id} not found")))?;
        if let Some(price) = price {
            showtime.price = price;
        }
        if let Some(premium_seats) = premium_seats {
            showtime.premium_seats = premium_seats;
        }
        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), AppError> {
        self.inner
            .write()
            .unwrap()
            .bookings
            .insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        Ok(self.inner.read().unwrap().bookings.get(&id).cloned())
    }

    async fn mark_booking_cancelled(
        &self,
        id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write().unwrap();
        let booking = inner
            .bookings
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Booking {id} not found")))?;
        booking.booking_status = BookingStatus::Cancelled;
        booking.cancellation_reason = Some(reason.to_string());
        booking.cancellation_date = Some(at);
        Ok(())
    }

    async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let mut bookings: Vec<Booking> = self
            .inner
            .read()
            .unwrap()
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, AppError> {
        let mut bookings: Vec<Booking> =
            self.inner.read().unwrap().bookings.values().cloned().collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn list_confirmed_for_showtime(
        &self,
        showtime_id: Uuid,
    ) -> Result<Vec<Booking>, AppError> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .bookings
            .values()
            .filter(|b| {
                b.showtime_id == showtime_id && b.booking_status == BookingStatus::Confirmed
            })
            .cloned()
            .collect())
    }

    async fn list_confirmed_upcoming(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .bookings
            .values()
            .filter(|b| b.booking_status == BookingStatus::Confirmed)
            .filter(|b| {
                inner
                    .showtimes
                    .get(&b.showtime_id)
                    .map_or(false, |s| s.start_time > now)
            })
            .cloned()
            .collect())
    }

    async fn resolve_booking(&self, id: Uuid) -> Result<Option<ResolvedBooking>, AppError> {
        let inner = self.inner.read().unwrap();
        let Some(booking) = inner.bookings.get(&id).cloned() else {
            return Ok(None);
        };

        let user = inner.users.get(&booking.user_id).cloned().ok_or_else(|| {
            AppError::DataIntegrity(format!("booking {id} references missing user"))
        })?;
        let movie = inner.movies.get(&booking.movie_id).cloned().ok_or_else(|| {
            AppError::DataIntegrity(format!("booking {id} references missing movie"))
        })?;
        let showtime = inner
            .showtimes
            .get(&booking.showtime_id)
            .cloned()
            .ok_or_else(|| {
                AppError::DataIntegrity(format!("booking {id} references missing showtime"))
            })?;
        let theater = inner
            .theaters
            .get(&booking.theater_id)
            .cloned()
            .ok_or_else(|| {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeatMap;

    fn showtime_fixture() -> Showtime {
        let map = SeatMap::fresh_grid(2, 2, vec![]);
        Showtime {
            id: Uuid::new_v4(),
            movie_id: Uuid::new_v4(),
            theater_id: Uuid::new_v4(),
            screen_id: Uuid::new_v4(),
            start_time: Utc::now() + chrono::Duration::hours(48),
            end_time: Utc::now() + chrono::Duration::hours(50),
            price: Decimal::from(200),
            total_seats: map.total_seats(),
            seats_per_row: 2,
            available_seats: map.available_seats(),
            booked_seats: vec![],
            premium_seats: vec![],
            status: ShowtimeStatus::Available,
            version: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn versioned_write_rejects_stale_versions() {
        let store = MemoryStore::new();
        let showtime = showtime_fixture();
        store.insert_showtime(&showtime).await.unwrap();

        let applied = store
            .update_showtime_seats(
                showtime.id,
                0,
                vec!["A2".into(), "B1".into(), "B2".into()],
                vec!["A1".into()],
                ShowtimeStatus::Available,
            )
            .await
            .unwrap();
        assert!(applied);

        // Same expected version again: the stored version moved to 1
        let applied = store
            .update_showtime_seats(
                showtime.id,
                0,
                vec![],
                vec![],
                ShowtimeStatus::Available,
            )
            .await
            .unwrap();
        assert!(!applied);

        let stored = store.get_showtime(showtime.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.booked_seats, vec!["A1".to_string()]);
    }

    #[tokio::test]
    async fn duplicate_slot_insert_is_a_conflict() {
        let store = MemoryStore::new();
        let showtime = showtime_fixture();
        store.insert_showtime(&showtime).await.unwrap();

        let mut duplicate = showtime_fixture();
        duplicate.theater_id = showtime.theater_id;
        duplicate.screen_id = showtime.screen_id;
        duplicate.start_time = showtime.start_time;

        let err = store.insert_showtime(&duplicate).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
