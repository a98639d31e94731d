use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::movie::Movie;
use super::showtime::Showtime;
use super::theater::Theater;
use super::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Upi,
    Wallet,
}

/// Movie and theater ids are denormalized at creation so the booking stays
/// historically stable even if the showtime is later edited.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub showtime_id: Uuid,
    pub movie_id: Uuid,
    pub theater_id: Uuid,
    pub seats: Vec<String>,
    pub number_of_tickets: i32,
    /// Fixed at booking time; never recomputed on reprice.
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    /// Opaque confirmation token from the payment collaborator.
    pub payment_ref: Option<String>,
    pub payment_status: PaymentStatus,
    pub booking_status: BookingStatus,
    pub booking_reference: String,
    pub cancellation_reason: Option<String>,
    pub cancellation_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Human-facing reference, generated once at creation and never reused:
    /// `BK` + millisecond timestamp + random uppercase suffix.
    pub fn generate_reference() -> String {
        let suffix = Uuid::new_v4().simple().to_string()[..9].to_uppercase();
        format!("BK{}{}", Utc::now().timestamp_millis(), suffix)
    }
}

/// A booking with every foreign reference resolved, as handed to the
/// notifier. Always looked up fresh; never cached across await points.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedBooking {
    pub booking: Booking,
    pub user: User,
    pub movie: Movie,
    pub showtime: Showtime,
    pub theater: Theater,
}
