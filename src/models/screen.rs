use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Screen {
    pub id: Uuid,
    pub theater_id: Uuid,
    pub screen_number: i32,
    pub format: String,
    pub seat_rows: i32,
    pub seat_columns: i32,
    pub premium_seats: Vec<String>,
    pub total_seats: i32,
    pub created_at: DateTime<Utc>,
}
