use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::models::ResolvedBooking;
use crate::utils::error::AppError;

/// Outbound user notifications. Implementations talk to the delivery channel
/// (email, push, ...); the core treats every call as best-effort and never
/// lets a notifier failure escape a booking response.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn booking_confirmed(&self, booking: &ResolvedBooking) -> Result<(), AppError>;

    async fn booking_cancelled(&self, booking: &ResolvedBooking) -> Result<(), AppError>;

    async fn reminder(&self, booking: &ResolvedBooking) -> Result<(), AppError>;

    async fn showtime_changed(
        &self,
        booking: &ResolvedBooking,
        old_start: DateTime<Utc>,
        new_start: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

/// Default notifier: structured log lines only. Stands in until a real
/// delivery channel is wired up.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn booking_confirmed(&self, booking: &ResolvedBooking) -> Result<(), AppError> {
        info!(
            booking_reference = %booking.booking.booking_reference,
            email = %booking.user.email,
            movie = %booking.movie.title,
            "booking confirmation notification"
        );
        Ok(())
    }

    async fn booking_cancelled(&self, booking: &ResolvedBooking) -> Result<(), AppError> {
        info!(
            booking_reference = %booking.booking.booking_reference,
            email = %booking.user.email,
            "booking cancellation notification"
        );
        Ok(())
    }

    async fn reminder(&self, booking: &ResolvedBooking) -> Result<(), AppError> {
        info!(
            booking_reference = %booking.booking.booking_reference,
            email = %booking.user.email,
            start_time = %booking.showtime.start_time,
            "showtime reminder notification"
        );
        Ok(())
    }

    async fn showtime_changed(
        &self,
        booking: &ResolvedBooking,
        old_start: DateTime<Utc>,
        new_start: DateTime<Utc>,
    ) -> Result<(), AppError> {
        info!(
            booking_reference = %booking.booking.booking_reference,
            email = %booking.user.email,
            old_start = %old_start,
            new_start = %new_start,
            "showtime change notification"
        );
        Ok(())
    }
}
