use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::external::{CatalogFilm, CatalogProvider};
use crate::models::{Movie, ReleaseStatus, SeatMap, Showtime, ShowtimeStatus, Theater};
use crate::store::CinemaStore;
use crate::utils::error::AppError;
use crate::utils::metrics::SyncMetrics;
use crate::utils::retry::{retry_with_backoff, RetryPolicy};

/// Titles fetched per movie-sync run.
const NOW_SHOWING_PAGE_SIZE: u32 = 50;

#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncOutcome {
    pub synced: u32,
    pub updated: u32,
    pub errors: Vec<String>,
}

/// Periodic reconciliation of local movies/showtimes against the external
/// catalog. Every invocation records exactly one sync run in the metrics,
/// and a failure that survives the retry policy propagates to the caller.
pub struct CinemaSyncService {
    store: Arc<dyn CinemaStore>,
    catalog: Arc<dyn CatalogProvider>,
    metrics: SyncMetrics,
    retry: RetryPolicy,
    default_price: Decimal,
}

impl CinemaSyncService {
    pub fn new(
        store: Arc<dyn CinemaStore>,
        catalog: Arc<dyn CatalogProvider>,
        metrics: SyncMetrics,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            catalog,
            metrics,
            retry,
            default_price: Decimal::from(250),
        }
    }

    /// Upserts the catalog's "now showing" page by title. The whole page is
    /// one retry unit.
    pub async fn sync_movies(&self) -> Result<SyncOutcome, AppError> {
        info!("starting movie sync");
        let started = Instant::now();

        let result = retry_with_backoff(self.retry, || self.sync_movies_once()).await;
        match result {
            Ok(outcome) => {
                info!(
                    synced = outcome.synced,
                    updated = outcome.updated,
                    errors = outcome.errors.len(),
                    "movie sync finished"
                );
                self.metrics.record(true, started.elapsed(), None);
                Ok(outcome)
            }
            Err(err) => {
                error!(error = %err, "movie sync failed");
                self.metrics
                    .record(false, started.elapsed(), Some(&err.to_string()));
                Err(err)
            }
        }
    }

    async fn sync_movies_once(&self) -> Result<SyncOutcome, AppError> {
        let films = self
            .catalog
            .fetch_now_showing(NOW_SHOWING_PAGE_SIZE)
            .await?;

        let mut outcome = SyncOutcome::default();
        for film in &films {
            match self.store.find_movie_by_title(&film.title).await {
                // No field-level diffing; an existing title just counts
                Ok(Some(_)) => outcome.updated += 1,
                Ok(None) => match self.store.insert_movie(&movie_from_catalog(film)).await {
                    Ok(()) => outcome.synced += 1,
                    Err(err) => {
                        warn!(film = %film.title, error = %err, "failed to persist synced movie");
                        outcome.errors.push(format!("{}: {err}", film.title));
                    }
                },
                Err(err) => {
                    warn!(film = %film.title, error = %err, "movie lookup failed during sync");
                    outcome.errors.push(format!("{}: {err}", film.title));
                }
            }
        }
        Ok(outcome)
    }

    /// Creates missing showtimes for every sync-enabled theater over the
    /// inclusive date range. Each theater-day is its own retry unit; a
    /// theater-day that still fails is recorded in the outcome and the run
    /// carries on.
    pub async fn sync_showtimes(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<SyncOutcome, AppError> {
        info!(%start_date, %end_date, "starting showtime sync");
        let started = Instant::now();

        match self.sync_showtimes_run(start_date, end_date).await {
            Ok(outcome) => {
                info!(
                    synced = outcome.synced,
                    errors = outcome.errors.len(),
                    "showtime sync finished"
                );
                self.metrics.record(true, started.elapsed(), None);
                Ok(outcome)
            }
            Err(err) => {
                error!(error = %err, "showtime sync failed");
                self.metrics
                    .record(false, started.elapsed(), Some(&err.to_string()));
                Err(err)
            }
        }
    }

    async fn sync_showtimes_run(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<SyncOutcome, AppError> {
        let theaters = self.store.list_sync_theaters().await?;

        let mut outcome = SyncOutcome::default();
        for theater in &theaters {
            let Some(cinema_id) = theater.external_cinema_id.clone() else {
                continue;
            };
            info!(theater = %theater.name, "syncing theater showtimes");

            let mut date = start_date;
            while date <= end_date {
                let attempt =
                    retry_with_backoff(self.retry, || self.sync_theater_day(theater, &cinema_id, date))
                        .await;
                match attempt {
                    Ok(created) => outcome.synced += created,
                    Err(err) => {
                        warn!(
                            theater = %theater.name,
                            %date,
                            error = %err,
                            "theater-day sync failed after retries"
                        );
                        outcome
                            .errors
                            .push(format!("{} {date}: {err}", theater.name));
                    }
                }
                match date.succ_opt() {
                    Some(next) => date = next,
                    None => break,
                }
            }
        }
        Ok(outcome)
    }

    async fn sync_theater_day(
        &self,
        theater: &Theater,
        cinema_id: &str,
        date: NaiveDate,
    ) -> Result<u32, AppError> {
        let listings = self
            .catalog
            .fetch_showtimes_for_cinema(cinema_id, date)
            .await?;

        let screens = self.store.list_screens(theater.id).await?;
        if screens.is_empty() {
            debug!(theater = %theater.name, "theater has no screens, skipping");
            return Ok(0);
        }

        let mut created = 0;
        for listing in &listings {
            // Showtime sync never creates movies as a side effect
            let Some(movie) = self.store.find_movie_by_title(&listing.film_title).await? else {
                debug!(film = %listing.film_title, "no local movie for catalog film, skipping");
                continue;
            };

            for time in &listing.times {
                let start_time = date.and_time(*time).and_utc();
                let end_time = start_time + chrono::Duration::minutes(movie.duration_mins as i64);

                if self
                    .store
                    .showtime_exists(theater.id, movie.id, start_time)
                    .await?
                {
                    continue;
                }

                let screen = &screens[rand::thread_rng().gen_range(0..screens.len())];
                let seat_map = SeatMap::fresh_grid(
                    screen.seat_rows as u32,
                    screen.seat_columns as u32,
                    screen.premium_seats.clone(),
                );
                let showtime = Showtime {
                    id: Uuid::new_v4(),
                    movie_id: movie.id,
                    theater_id: theater.id,
                    screen_id: screen.id,
                    start_time,
                    end_time,
                    price: self.default_price,
                    total_seats: seat_map.total_seats(),
                    seats_per_row: screen.seat_columns,
                    available_seats: seat_map.available_seats(),
                    booked_seats: Vec::new(),
                    premium_seats: screen.premium_seats.clone(),
                    status: ShowtimeStatus::Available,
                    version: 0,
                    created_at: Utc::now(),
                };
                match self.store.insert_showtime(&showtime).await {
                    Ok(()) => created += 1,
                    Err(AppError::Conflict(_)) => {
                        // Another showing (or a concurrent sync) already
                        // holds this screen slot
                        debug!(
                            theater = %theater.name,
                            %start_time,
                            "screen slot already occupied, skipping"
                        );
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(created)
    }
}

fn movie_from_catalog(film: &CatalogFilm) -> Movie {
    Movie {
        id: Uuid::new_v4(),
        title: film.title.clone(),
        description: film
            .synopsis
            .clone()
            .unwrap_or_else(|| "No synopsis available".to_string()),
        genres: if film.genres.is_empty() {
            vec!["Unknown".to_string()]
        } else {
            film.genres.clone()
        },
        duration_mins: film.duration_mins.unwrap_or(120),
        release_date: film.release_date.unwrap_or_else(Utc::now),
        poster_url: film.poster_url.clone(),
        backdrop_url: film.backdrop_url.clone(),
        rating: None,
        languages: vec!["English".to_string()],
        formats: vec!["2D".to_string()],
        release_status: ReleaseStatus::NowShowing,
        created_at: Utc::now(),
    }
}
