use std::sync::Arc;

use crate::services::{
    BookingService, CinemaSyncService, ConsistencyChecker, ReminderScheduler, ShowtimeService,
    SyncJobRunner,
};
use crate::utils::metrics::SyncMetrics;

/// Everything the HTTP layer needs, wired once at startup. Services are
/// explicit dependencies here rather than process-global singletons so each
/// can be constructed in isolation under test.
#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService>,
    pub showtimes: Arc<ShowtimeService>,
    pub reminders: ReminderScheduler,
    pub sync: Arc<CinemaSyncService>,
    pub sync_jobs: Arc<SyncJobRunner>,
    pub consistency: Arc<ConsistencyChecker>,
    pub metrics: SyncMetrics,
}
