use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::external::Notifier;
use crate::models::BookingStatus;
use crate::store::CinemaStore;
use crate::utils::error::AppError;

struct ReminderJob {
    fire_at: DateTime<Utc>,
    handle: JoinHandle<()>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderJobInfo {
    pub booking_id: Uuid,
    pub fire_at: DateTime<Utc>,
}

/// One-shot deferred reminder per confirmed booking. Jobs live in process
/// memory and are keyed by booking id; `restore` rebuilds the set from the
/// store after a restart.
#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn CinemaStore>,
    notifier: Arc<dyn Notifier>,
    lead: Duration,
    jobs: Mutex<HashMap<Uuid, ReminderJob>>,
}

impl ReminderScheduler {
    pub fn new(store: Arc<dyn CinemaStore>, notifier: Arc<dyn Notifier>, lead: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                notifier,
                lead,
                jobs: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Schedules the reminder for a booking. All failures are swallowed: a
    /// missing reminder never blocks a booking response.
    pub async fn schedule(&self, booking_id: Uuid) {
        if let Err(err) = self.try_schedule(booking_id).await {
            warn!(booking_id = %booking_id, error = %err, "failed to schedule reminder");
        }
    }

    async fn try_schedule(&self, booking_id: Uuid) -> Result<(), AppError> {
        // Re-read rather than trusting whatever the caller holds
        let resolved = self
            .inner
            .store
            .resolve_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {booking_id} not found")))?;

        let fire_at = resolved.showtime.start_time - self.inner.lead;
        let now = Utc::now();
        if fire_at <= now {
            // A missed reminder is acceptable; a duplicate is not
            debug!(booking_id = %booking_id, %fire_at, "reminder time already passed, skipping");
            return Ok(());
        }

        let delay = (fire_at - now).to_std().unwrap_or_default();
        let scheduler = self.clone();

        // Register under the lock before the task can fire: a fired job
        // removes its own entry and must find it present.
        {
            let mut jobs = self.inner.jobs.lock().unwrap();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                scheduler.fire(booking_id).await;
            });
            if let Some(previous) = jobs.insert(booking_id, ReminderJob { fire_at, handle }) {
                previous.handle.abort();
            }
        }
        info!(booking_id = %booking_id, %fire_at, "reminder scheduled");
        Ok(())
    }

    async fn fire(&self, booking_id: Uuid) {
        // Always read fresh at fire time: a booking cancelled after
        // scheduling must not produce a reminder.
        match self.inner.store.resolve_booking(booking_id).await {
            Ok(Some(resolved))
                if resolved.booking.booking_status == BookingStatus::Confirmed =>
            {
                match self.inner.notifier.reminder(&resolved).await {
                    Ok(()) => {
                        info!(
                            booking_id = %booking_id,
                            email = %resolved.user.email,
                            "reminder sent"
                        );
                    }
                    Err(err) => {
                        // Not retried, not escalated
                        warn!(booking_id = %booking_id, error = %err, "reminder notification failed");
                    }
                }
            }
            Ok(_) => {
                debug!(booking_id = %booking_id, "booking no longer confirmed, reminder suppressed");
            }
            Err(err) => {
                warn!(booking_id = %booking_id, error = %err, "could not load booking for reminder");
            }
        }
        self.inner.jobs.lock().unwrap().remove(&booking_id);
    }

    /// Stops and removes the job if present; no-op otherwise. Called
    /// synchronously from the cancellation path.
    pub fn cancel(&self, booking_id: Uuid) {
        if let Some(job) = self.inner.jobs.lock().unwrap().remove(&booking_id) {
            job.handle.abort();
            info!(booking_id = %booking_id, "reminder cancelled");
        }
    }

    /// Operational snapshot of pending jobs, soonest first.
    pub fn jobs_info(&self) -> Vec<ReminderJobInfo> {
        let jobs = self.inner.jobs.lock().unwrap();
        let mut info: Vec<ReminderJobInfo> = jobs
            .iter()
            .map(|(booking_id, job)| ReminderJobInfo {
                booking_id: *booking_id,
                fire_at: job.fire_at,
            })
            .collect();
        info.sort_by_key(|j| j.fire_at);
        info
    }

    /// Rebuilds the job set after a restart by scanning confirmed bookings
    /// with future showtimes. Returns how many were rescheduled.
    pub async fn restore(&self) -> usize {
        let bookings = match self.inner.store.list_confirmed_upcoming(Utc::now()).await {
            Ok(bookings) => bookings,
            Err(err) => {
                warn!(error = %err, "could not scan bookings to restore reminders");
                return 0;
            }
        };
        let mut restored = 0;
        for booking in bookings {
            self.schedule(booking.id).await;
            restored += 1;
        }
        info!(restored, "reminder jobs restored from store");
        restored
    }
}
