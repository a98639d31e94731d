use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::debug;

use crate::utils::error::AppError;

/// A "now showing" title as the catalog provider shapes it, before mapping
/// into a local movie record.
#[derive(Debug, Clone)]
pub struct CatalogFilm {
    pub title: String,
    pub synopsis: Option<String>,
    pub genres: Vec<String>,
    pub duration_mins: Option<i32>,
    pub release_date: Option<DateTime<Utc>>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
}

/// One film's showings at one cinema on one date.
#[derive(Debug, Clone)]
pub struct CatalogListing {
    pub film_title: String,
    pub times: Vec<NaiveTime>,
}

/// External movie/showtime catalog (TMDB, MovieGlu, ...). The sync engine is
/// the only consumer; transport and authentication live behind this trait.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch_now_showing(&self, limit: u32) -> Result<Vec<CatalogFilm>, AppError>;

    async fn fetch_showtimes_for_cinema(
        &self,
        cinema_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<CatalogListing>, AppError>;
}

/// Placeholder provider for deployments without catalog credentials: every
/// page is empty, so sync runs succeed and create nothing.
pub struct NullCatalog;

#[async_trait]
impl CatalogProvider for NullCatalog {
    async fn fetch_now_showing(&self, limit: u32) -> Result<Vec<CatalogFilm>, AppError> {
        debug!(limit, "catalog provider not configured, returning empty page");
        Ok(Vec::new())
    }

    async fn fetch_showtimes_for_cinema(
        &self,
        cinema_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<CatalogListing>, AppError> {
        debug!(cinema_id, %date, "catalog provider not configured, returning empty page");
        Ok(Vec::new())
    }
}
