use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::external::Notifier;
use crate::models::{
    Booking, BookingStatus, PaymentMethod, PaymentStatus, PremiumPricing, Showtime,
};
use crate::store::CinemaStore;
use crate::utils::error::AppError;

use super::reminders::ReminderScheduler;

/// How many times a seat claim re-reads and retries after losing a version
/// race before giving up.
const SEAT_CLAIM_ATTEMPTS: u32 = 3;
/// Seat release is an idempotent set move, so it gets more headroom; losing
/// here would strand inventory.
const SEAT_RELEASE_ATTEMPTS: u32 = 8;

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub showtime_id: Uuid,
    pub seats: Vec<String>,
    pub payment_method: PaymentMethod,
    /// Confirmation token already obtained from the payment collaborator.
    /// Present: the booking is confirmed immediately. Absent: it stays
    /// pending until payment completes.
    pub payment_ref: Option<String>,
}

/// Owns the booking lifecycle: seat claims and releases, pricing, the
/// booking state machine, and the best-effort side effects hanging off it.
pub struct BookingService {
    store: Arc<dyn CinemaStore>,
    notifier: Arc<dyn Notifier>,
    reminders: ReminderScheduler,
    pricing: PremiumPricing,
    heal_grid: (u32, u32),
}

impl BookingService {
    pub fn new(
        store: Arc<dyn CinemaStore>,
        notifier: Arc<dyn Notifier>,
        reminders: ReminderScheduler,
        pricing: PremiumPricing,
        heal_grid: (u32, u32),
    ) -> Self {
        Self {
            store,
            notifier,
            reminders,
            pricing,
            heal_grid,
        }
    }

    pub async fn create_booking(&self, req: NewBooking) -> Result<Booking, AppError> {
        if req.seats.is_empty() {
            return Err(AppError::ValidationError(
                "At least one seat must be selected".to_string(),
            ));
        }
        let distinct: HashSet<&String> = req.seats.iter().collect();
        if distinct.len() != req.seats.len() {
            return Err(AppError::ValidationError(
                "Duplicate seats in selection".to_string(),
            ));
        }

        for _ in 0..SEAT_CLAIM_ATTEMPTS {
            let showtime = self.load_showtime_checked(req.showtime_id).await?;

            let mut seat_map = showtime.seat_map();
            if seat_map.is_unmaterialized() {
                // Legacy rows created before seat universes were written out.
                // Heal once, persist, and go around again with fresh state.
                warn!(
                    showtime_id = %showtime.id,
                    total_seats = showtime.total_seats,
                    "seat universe never materialized, healing with default grid"
                );
                seat_map.materialize_default_grid(self.heal_grid.0, self.heal_grid.1);
                self.store
                    .update_showtime_seats(
                        showtime.id,
                        showtime.version,
                        seat_map.available_seats(),
                        seat_map.booked_seats(),
                        seat_map.derived_status(showtime.status),
                    )
                    .await?;
                continue;
            }

            let unavailable = seat_map.unavailable_of(&req.seats);
            if !unavailable.is_empty() {
                return Err(AppError::SeatsUnavailable(unavailable));
            }

            seat_map.take(&req.seats);
            let applied = self
                .store
                .update_showtime_seats(
                    showtime.id,
                    showtime.version,
                    seat_map.available_seats(),
                    seat_map.booked_seats(),
                    seat_map.derived_status(showtime.status),
                )
                .await?;
            if !applied {
                // Lost the version race; reload and re-check availability
                continue;
            }

            let total_amount = self.pricing.total(showtime.price, &req.seats, &seat_map);
            let confirmed = req.payment_ref.is_some();
            let booking = Booking {
                id: Uuid::new_v4(),
                user_id: req.user_id,
                showtime_id: showtime.id,
                movie_id: showtime.movie_id,
                theater_id: showtime.theater_id,
                seats: req.seats.clone(),
                number_of_tickets: req.seats.len() as i32,
                total_amount,
                payment_method: req.payment_method,
                payment_ref: req.payment_ref.clone(),
                payment_status: if confirmed {
                    PaymentStatus::Completed
                } else {
                    PaymentStatus::Pending
                },
                booking_status: if confirmed {
                    BookingStatus::Confirmed
                } else {
                    BookingStatus::Pending
                },
                booking_reference: Booking::generate_reference(),
                cancellation_reason: None,
                cancellation_date: None,
                created_at: Utc::now(),
            };

            if let Err(err) = self.store.insert_booking(&booking).await {
                // The seats were already claimed; hand them back before
                // surfacing the failure so no partial mutation survives.
                if let Err(release_err) = self.release_seats(showtime.id, &req.seats).await {
                    error!(
                        showtime_id = %showtime.id,
                        error = %release_err,
                        "failed to release seats after booking insert failure"
                    );
                }
                return Err(err);
            }

            info!(
                booking_id = %booking.id,
                booking_reference = %booking.booking_reference,
                seats = booking.number_of_tickets,
                status = ?booking.booking_status,
                "booking created"
            );

            if booking.booking_status == BookingStatus::Confirmed {
                self.confirmed_side_effects(&booking).await;
            }
            return Ok(booking);
        }

        Err(AppError::Conflict(
            "Could not claim seats due to concurrent bookings, please retry".to_string(),
        ))
    }

    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        requester_id: Uuid,
        reason: Option<String>,
    ) -> Result<Booking, AppError> {
        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {booking_id} not found")))?;

        if booking.user_id != requester_id {
            return Err(AppError::Forbidden(
                "You do not own this booking".to_string(),
            ));
        }
        if booking.booking_status == BookingStatus::Cancelled {
            return Err(AppError::AlreadyCancelled(booking_id));
        }

        let reason = reason.unwrap_or_else(|| "User requested cancellation".to_string());
        self.store
            .mark_booking_cancelled(booking_id, &reason, Utc::now())
            .await?;

        // Synchronous: a cancelled booking must never fire a reminder
        self.reminders.cancel(booking_id);

        if let Err(err) = self.release_seats(booking.showtime_id, &booking.seats).await {
            error!(
                booking_id = %booking_id,
                showtime_id = %booking.showtime_id,
                error = %err,
                "failed to return cancelled seats to availability"
            );
        }

        match self.store.resolve_booking(booking_id).await {
            Ok(Some(resolved)) => {
                if let Err(err) = self.notifier.booking_cancelled(&resolved).await {
                    warn!(booking_id = %booking_id, error = %err, "cancellation notification failed");
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(booking_id = %booking_id, error = %err, "could not resolve booking for cancellation notice");
            }
        }

        self.store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {booking_id} not found")))
    }

    /// Time change fan-out: every confirmed booking's holder is told the old
    /// and new start. Per-recipient failures are counted, never fatal.
    pub async fn reschedule_showtime(
        &self,
        showtime_id: Uuid,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> Result<usize, AppError> {
        if new_end <= new_start {
            return Err(AppError::InvalidTimeRange);
        }
        let showtime = self
            .store
            .get_showtime(showtime_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Showtime {showtime_id} not found")))?;
        let old_start = showtime.start_time;

        self.store
            .update_showtime_times(showtime_id, new_start, new_end)
            .await?;

        let confirmed = self.store.list_confirmed_for_showtime(showtime_id).await?;
        let total = confirmed.len();
        let mut notified = 0;
        for booking in confirmed {
            match self.store.resolve_booking(booking.id).await {
                Ok(Some(resolved)) => {
                    match self
                        .notifier
                        .showtime_changed(&resolved, old_start, new_start)
                        .await
                    {
                        Ok(()) => notified += 1,
                        Err(err) => {
                            warn!(booking_id = %booking.id, error = %err, "showtime change notification failed");
                        }
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(booking_id = %booking.id, error = %err, "could not resolve booking for showtime change notice");
                }
            }
        }

        info!(
            showtime_id = %showtime_id,
            notified,
            total,
            "showtime rescheduled"
        );
        Ok(notified)
    }

    pub async fn get_booking_for(
        &self,
        booking_id: Uuid,
        requester_id: Uuid,
    ) -> Result<Booking, AppError> {
        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {booking_id} not found")))?;
        if booking.user_id != requester_id {
            return Err(AppError::Forbidden(
                "You do not own this booking".to_string(),
            ));
        }
        Ok(booking)
    }

    pub async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        self.store.list_user_bookings(user_id).await
    }

    pub async fn list_all_bookings(&self) -> Result<Vec<Booking>, AppError> {
        self.store.list_bookings().await
    }

    /// Loads a showtime and rejects dangling movie/theater references before
    /// any seat is touched.
    async fn load_showtime_checked(&self, showtime_id: Uuid) -> Result<Showtime, AppError> {
        let showtime = self
            .store
            .get_showtime(showtime_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Showtime {showtime_id} not found")))?;

        if self.store.get_movie(showtime.movie_id).await?.is_none() {
            return Err(AppError::DataIntegrity(format!(
                "showtime {showtime_id} references a missing movie"
            )));
        }
        if self.store.get_theater(showtime.theater_id).await?.is_none() {
            return Err(AppError::DataIntegrity(format!(
                "showtime {showtime_id} references a missing theater"
            )));
        }
        Ok(showtime)
    }

    async fn release_seats(&self, showtime_id: Uuid, seats: &[String]) -> Result<(), AppError> {
        for _ in 0..SEAT_RELEASE_ATTEMPTS {
            let showtime = self
                .store
                .get_showtime(showtime_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Showtime {showtime_id} not found")))?;
            let mut seat_map = showtime.seat_map();
            seat_map.release(seats);
            let applied = self
                .store
                .update_showtime_seats(
                    showtime.id,
                    showtime.version,
                    seat_map.available_seats(),
                    seat_map.booked_seats(),
                    seat_map.derived_status(showtime.status),
                )
                .await?;
            if applied {
                return Ok(());
            }
        }
        Err(AppError::Conflict(
            "Could not release seats due to concurrent updates".to_string(),
        ))
    }

    /// Confirmation notice plus reminder scheduling. Both are conveniences:
    /// failures are logged and the booking response is unaffected.
    async fn confirmed_side_effects(&self, booking: &Booking) {
        match self.store.resolve_booking(booking.id).await {
            Ok(Some(resolved)) => {
                if let Err(err) = self.notifier.booking_confirmed(&resolved).await {
                    warn!(booking_id = %booking.id, error = %err, "confirmation notification failed");
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(booking_id = %booking.id, error = %err, "could not resolve booking for confirmation notice");
            }
        }
        self.reminders.schedule(booking.id).await;
    }
}
