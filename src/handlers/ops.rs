use axum::extract::{Query, State};
use axum::response::Response;
use chrono::Utc;
use serde::Deserialize;

use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn reminder_jobs(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(success(
        state.reminders.jobs_info(),
        "Scheduled reminder jobs",
    ))
}

pub async fn trigger_movie_sync(State(state): State<AppState>) -> Result<Response, AppError> {
    let outcome = state.sync.sync_movies().await?;
    Ok(success(outcome, "Movie sync completed"))
}

#[derive(Deserialize)]
pub struct ShowtimeSyncQuery {
    pub days: Option<i64>,
}

pub async fn trigger_showtime_sync(
    State(state): State<AppState>,
    Query(query): Query<ShowtimeSyncQuery>,
) -> Result<Response, AppError> {
    let start = Utc::now().date_naive();
    let end = start + chrono::Duration::days(query.days.unwrap_or(7));
    let outcome = state.sync.sync_showtimes(start, end).await?;
    Ok(success(outcome, "Showtime sync completed"))
}

pub async fn sync_metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(success(state.metrics.snapshot(), "Sync metrics"))
}

pub async fn sync_jobs(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(success(state.sync_jobs.jobs_info(), "Scheduled sync jobs"))
}

pub async fn consistency_check(State(state): State<AppState>) -> Result<Response, AppError> {
    let report = state.consistency.verify().await;
    Ok(success(report, "Consistency check completed"))
}
