use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::store::CinemaStore;
use crate::utils::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct ConsistencyReport {
    pub is_consistent: bool,
    pub issues: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

/// Read-only invariant scan over the showtime catalog: dangling references
/// and duplicate screenings. Never mutates anything.
pub struct ConsistencyChecker {
    store: Arc<dyn CinemaStore>,
}

impl ConsistencyChecker {
    pub fn new(store: Arc<dyn CinemaStore>) -> Self {
        Self { store }
    }

    pub async fn verify(&self) -> ConsistencyReport {
        let mut issues = Vec::new();
        if let Err(err) = self.scan(&mut issues).await {
            issues.push(format!("Error running consistency check: {err}"));
        }
        ConsistencyReport {
            is_consistent: issues.is_empty(),
            issues,
            checked_at: Utc::now(),
        }
    }

    async fn scan(&self, issues: &mut Vec<String>) -> Result<(), AppError> {
        let showtimes = self.store.list_showtimes(None, None).await?;

        for showtime in &showtimes {
            if self.store.get_movie(showtime.movie_id).await?.is_none() {
                issues.push(format!(
                    "Showtime {} references non-existent movie {}",
                    showtime.id, showtime.movie_id
                ));
            }
            if self.store.get_theater(showtime.theater_id).await?.is_none() {
                issues.push(format!(
                    "Showtime {} references non-existent theater {}",
                    showtime.id, showtime.theater_id
                ));
            }
        }

        let mut groups: HashMap<(Uuid, Uuid, Uuid, DateTime<Utc>), u32> = HashMap::new();
        for showtime in &showtimes {
            *groups
                .entry((
                    showtime.movie_id,
                    showtime.theater_id,
                    showtime.screen_id,
                    showtime.start_time,
                ))
                .or_default() += 1;
        }
        let duplicate_sets = groups.values().filter(|count| **count > 1).count();
        if duplicate_sets > 0 {
            issues.push(format!(
                "Found {duplicate_sets} sets of duplicate showtimes"
            ));
        }

        Ok(())
    }
}
