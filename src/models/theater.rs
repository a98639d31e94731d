use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Theater {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub address: String,
    pub phone_number: Option<String>,
    /// The catalog provider's id for this cinema. Theaters without one are
    /// never picked up by the showtime sync.
    pub external_cinema_id: Option<String>,
    pub sync_enabled: bool,
    pub created_at: DateTime<Utc>,
}
