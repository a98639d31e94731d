use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "release_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseStatus {
    Upcoming,
    NowShowing,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Movie {
    pub id: Uuid,
    /// Upsert key for the external-catalog sync.
    pub title: String,
    pub description: String,
    pub genres: Vec<String>,
    pub duration_mins: i32,
    pub release_date: DateTime<Utc>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub rating: Option<f64>,
    pub languages: Vec<String>,
    pub formats: Vec<String>,
    pub release_status: ReleaseStatus,
    pub created_at: DateTime<Utc>,
}
