pub mod booking;
pub mod consistency;
pub mod reminders;
pub mod showtimes;
pub mod sync;
pub mod sync_jobs;

pub use booking::{BookingService, NewBooking};
pub use consistency::{ConsistencyChecker, ConsistencyReport};
pub use reminders::{ReminderJobInfo, ReminderScheduler};
pub use showtimes::{NewShowtime, ShowtimeService};
pub use sync::{CinemaSyncService, SyncOutcome};
pub use sync_jobs::{SyncJobInfo, SyncJobRunner, SyncJobsConfig};
