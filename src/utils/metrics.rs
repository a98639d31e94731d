use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Process-wide counters describing sync health. Cloning is cheap and every
/// clone reports into the same totals.
#[derive(Clone, Default)]
pub struct SyncMetrics {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    total_syncs: AtomicU64,
    successful_syncs: AtomicU64,
    failed_syncs: AtomicU64,
    // Accumulated over successful runs only
    total_time_ms: AtomicU64,
    last: Mutex<LastSync>,
}

#[derive(Default)]
struct LastSync {
    error: Option<String>,
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncMetricsSnapshot {
    pub total_syncs: u64,
    pub successful_syncs: u64,
    pub failed_syncs: u64,
    pub total_time_ms: u64,
    pub average_time_ms: u64,
    pub success_rate: String,
    pub last_error: Option<String>,
    pub last_sync_timestamp: Option<DateTime<Utc>>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, success: bool, duration: Duration, error: Option<&str>) {
        self.inner.total_syncs.fetch_add(1, Ordering::Relaxed);

        let mut last = self.inner.last.lock().unwrap();
        last.timestamp = Some(Utc::now());

        if success {
            self.inner.successful_syncs.fetch_add(1, Ordering::Relaxed);
            self.inner
                .total_time_ms
                .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
        } else {
            self.inner.failed_syncs.fetch_add(1, Ordering::Relaxed);
            last.error = Some(error.unwrap_or("unknown error").to_string());
        }
    }

    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        let total = self.inner.total_syncs.load(Ordering::Relaxed);
        let successful = self.inner.successful_syncs.load(Ordering::Relaxed);
        let failed = self.inner.failed_syncs.load(Ordering::Relaxed);
        let total_time_ms = self.inner.total_time_ms.load(Ordering::Relaxed);

        let average_time_ms = if successful > 0 {
            total_time_ms / successful
        } else {
            0
        };
        let success_rate = if total > 0 {
            format!("{:.2}%", successful as f64 / total as f64 * 100.0)
        } else {
            "0%".to_string()
        };

        let last = self.inner.last.lock().unwrap();
        SyncMetricsSnapshot {
            total_syncs: total,
            successful_syncs: successful,
            failed_syncs: failed,
            total_time_ms,
            average_time_ms,
            success_rate,
            last_error: last.error.clone(),
            last_sync_timestamp: last.timestamp,
        }
    }
}
