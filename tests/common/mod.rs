#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use marquee_server::external::{
    CatalogFilm, CatalogListing, CatalogProvider, Notifier,
};
use marquee_server::models::{
    Booking, BookingStatus, Movie, PaymentMethod, PaymentStatus, PremiumPricing, ReleaseStatus,
    ResolvedBooking, Screen, SeatMap, Showtime, ShowtimeStatus, Theater, User,
};
use marquee_server::services::{BookingService, ReminderScheduler};
use marquee_server::store::{CinemaStore, MemoryStore};
use marquee_server::utils::error::AppError;

/// Notifier double that counts every call.
#[derive(Default)]
pub struct RecordingNotifier {
    pub confirmed: AtomicU32,
    pub cancelled: AtomicU32,
    pub reminders: AtomicU32,
    pub showtime_changes: AtomicU32,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn confirmed_count(&self) -> u32 {
        self.confirmed.load(Ordering::SeqCst)
    }

    pub fn cancelled_count(&self) -> u32 {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn reminder_count(&self) -> u32 {
        self.reminders.load(Ordering::SeqCst)
    }

    pub fn showtime_change_count(&self) -> u32 {
        self.showtime_changes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn booking_confirmed(&self, _booking: &ResolvedBooking) -> Result<(), AppError> {
        self.confirmed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn booking_cancelled(&self, _booking: &ResolvedBooking) -> Result<(), AppError> {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reminder(&self, _booking: &ResolvedBooking) -> Result<(), AppError> {
        self.reminders.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn showtime_changed(
        &self,
        _booking: &ResolvedBooking,
        _old_start: DateTime<Utc>,
        _new_start: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.showtime_changes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Catalog double returning scripted pages, optionally failing the first N
/// calls to exercise the retry path.
#[derive(Default)]
pub struct ScriptedCatalog {
    pub films: Vec<CatalogFilm>,
    pub listings: Vec<CatalogListing>,
    pub failures_remaining: AtomicU32,
    pub calls: AtomicU32,
}

impl ScriptedCatalog {
    pub fn new(films: Vec<CatalogFilm>, listings: Vec<CatalogListing>) -> Arc<Self> {
        Arc::new(Self {
            films,
            listings,
            ..Self::default()
        })
    }

    pub fn failing_first(self: Arc<Self>, failures: u32) -> Arc<Self> {
        self.failures_remaining.store(failures, Ordering::SeqCst);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn maybe_fail(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::ExternalSync("catalog unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogProvider for ScriptedCatalog {
    async fn fetch_now_showing(&self, _limit: u32) -> Result<Vec<CatalogFilm>, AppError> {
        self.maybe_fail()?;
        Ok(self.films.clone())
    }

    async fn fetch_showtimes_for_cinema(
        &self,
        _cinema_id: &str,
        _date: NaiveDate,
    ) -> Result<Vec<CatalogListing>, AppError> {
        self.maybe_fail()?;
        Ok(self.listings.clone())
    }
}

pub fn make_user(name: &str) -> User {
    User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: Some("555-0100".to_string()),
        created_at: Utc::now(),
    }
}

pub fn make_movie(title: &str) -> Movie {
    Movie {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: "A film".to_string(),
        genres: vec!["Drama".to_string()],
        duration_mins: 120,
        release_date: Utc::now(),
        poster_url: None,
        backdrop_url: None,
        rating: Some(7.5),
        languages: vec!["English".to_string()],
        formats: vec!["2D".to_string()],
        release_status: ReleaseStatus::NowShowing,
        created_at: Utc::now(),
    }
}

pub fn make_theater(name: &str, external_cinema_id: Option<&str>) -> Theater {
    Theater {
        id: Uuid::new_v4(),
        name: name.to_string(),
        city: "Springfield".to_string(),
        address: "1 Main St".to_string(),
        phone_number: None,
        external_cinema_id: external_cinema_id.map(str::to_string),
        sync_enabled: external_cinema_id.is_some(),
        created_at: Utc::now(),
    }
}

pub fn make_screen(theater_id: Uuid, rows: i32, cols: i32, premium: Vec<String>) -> Screen {
    Screen {
        id: Uuid::new_v4(),
        theater_id,
        screen_number: 1,
        format: "2D".to_string(),
        seat_rows: rows,
        seat_columns: cols,
        premium_seats: premium,
        total_seats: rows * cols,
        created_at: Utc::now(),
    }
}

pub fn make_showtime(
    movie_id: Uuid,
    theater_id: Uuid,
    screen_id: Uuid,
    start_in: Duration,
    premium: Vec<String>,
) -> Showtime {
    let seat_map = SeatMap::fresh_grid(10, 10, premium.clone());
    let start_time = Utc::now() + start_in;
    Showtime {
        id: Uuid::new_v4(),
        movie_id,
        theater_id,
        screen_id,
        start_time,
        end_time: start_time + Duration::hours(2),
        price: Decimal::from(200),
        total_seats: seat_map.total_seats(),
        seats_per_row: 10,
        available_seats: seat_map.available_seats(),
        booked_seats: Vec::new(),
        premium_seats: premium,
        status: ShowtimeStatus::Available,
        version: 0,
        created_at: Utc::now(),
    }
}

/// Confirmed booking row, inserted directly when a test needs store state
/// without going through the booking engine.
pub fn make_confirmed_booking(user_id: Uuid, showtime: &Showtime, seats: Vec<String>) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        user_id,
        showtime_id: showtime.id,
        movie_id: showtime.movie_id,
        theater_id: showtime.theater_id,
        number_of_tickets: seats.len() as i32,
        seats,
        total_amount: Decimal::from(200),
        payment_method: PaymentMethod::CreditCard,
        payment_ref: Some("pi_test".to_string()),
        payment_status: PaymentStatus::Completed,
        booking_status: BookingStatus::Confirmed,
        booking_reference: Booking::generate_reference(),
        cancellation_reason: None,
        cancellation_date: None,
        created_at: Utc::now(),
    }
}

/// A fully wired booking environment over the in-memory store: one user, one
/// movie, one theater with a 10x10 screen, and one showtime 48h out with A1
/// as its only premium seat.
pub struct TestEnv {
    pub store: Arc<dyn CinemaStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub reminders: ReminderScheduler,
    pub bookings: Arc<BookingService>,
    pub user: User,
    pub movie: Movie,
    pub theater: Theater,
    pub screen: Screen,
    pub showtime: Showtime,
}

pub async fn booking_env() -> TestEnv {
    booking_env_with(Duration::hours(24), Duration::hours(48)).await
}

pub async fn booking_env_with(lead: Duration, showtime_starts_in: Duration) -> TestEnv {
    let store: Arc<dyn CinemaStore> = Arc::new(MemoryStore::new());
    let notifier = RecordingNotifier::new();

    let user = make_user("Alice");
    let movie = make_movie("Night Train");
    let theater = make_theater("Grand Central", None);
    let screen = make_screen(theater.id, 10, 10, vec!["A1".to_string()]);
    let showtime = make_showtime(
        movie.id,
        theater.id,
        screen.id,
        showtime_starts_in,
        vec!["A1".to_string()],
    );

    store.insert_user(&user).await.unwrap();
    store.insert_movie(&movie).await.unwrap();
    store.insert_theater(&theater).await.unwrap();
    store.insert_screen(&screen).await.unwrap();
    store.insert_showtime(&showtime).await.unwrap();

    let reminders = ReminderScheduler::new(
        store.clone(),
        notifier.clone() as Arc<dyn Notifier>,
        lead,
    );
    let bookings = Arc::new(BookingService::new(
        store.clone(),
        notifier.clone() as Arc<dyn Notifier>,
        reminders.clone(),
        PremiumPricing::default(),
        (10, 10),
    ));

    TestEnv {
        store,
        notifier,
        reminders,
        bookings,
        user,
        movie,
        theater,
        screen,
        showtime,
    }
}
