use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::sync::CinemaSyncService;

#[derive(Debug, Clone)]
pub struct SyncJobsConfig {
    pub enabled: bool,
    pub movie_sync_interval: Duration,
    pub showtime_sync_interval: Duration,
    pub showtime_sync_horizon_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncJobInfo {
    pub name: String,
    pub next_invocation: Option<DateTime<Utc>>,
}

/// Recurring sync loops with an explicit lifecycle. A failed tick is logged
/// and the loop waits for the next one; nothing here can kill the runner.
pub struct SyncJobRunner {
    sync: Arc<CinemaSyncService>,
    config: SyncJobsConfig,
    next_runs: Arc<Mutex<HashMap<&'static str, DateTime<Utc>>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncJobRunner {
    pub fn new(sync: Arc<CinemaSyncService>, config: SyncJobsConfig) -> Self {
        Self {
            sync,
            config,
            next_runs: Arc::new(Mutex::new(HashMap::new())),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn start(&self) {
        if !self.config.enabled {
            info!("auto-sync disabled via environment");
            return;
        }
        info!("initializing scheduled sync jobs");

        let mut handles = self.handles.lock().unwrap();
        handles.push(self.spawn_movie_sync());
        handles.push(self.spawn_showtime_sync());
    }

    fn spawn_movie_sync(&self) -> JoinHandle<()> {
        let sync = self.sync.clone();
        let next_runs = self.next_runs.clone();
        let period = self.config.movie_sync_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The immediate first tick; syncs start one period out
            ticker.tick().await;
            loop {
                note_next_run(&next_runs, "movie-sync", period);
                ticker.tick().await;
                info!("running scheduled movie sync");
                if let Err(err) = sync.sync_movies().await {
                    error!(error = %err, "scheduled movie sync failed");
                }
            }
        })
    }

    fn spawn_showtime_sync(&self) -> JoinHandle<()> {
        let sync = self.sync.clone();
        let next_runs = self.next_runs.clone();
        let period = self.config.showtime_sync_interval;
        let horizon_days = self.config.showtime_sync_horizon_days;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                note_next_run(&next_runs, "showtime-sync", period);
                ticker.tick().await;
                info!(horizon_days, "running scheduled showtime sync");
                let today = Utc::now().date_naive();
                let end = today + chrono::Duration::days(horizon_days);
                if let Err(err) = sync.sync_showtimes(today, end).await {
                    error!(error = %err, "scheduled showtime sync failed");
                }
            }
        })
    }

    pub fn jobs_info(&self) -> Vec<SyncJobInfo> {
        if !self.config.enabled {
            return Vec::new();
        }
        let next_runs = self.next_runs.lock().unwrap();
        let mut info: Vec<SyncJobInfo> = ["movie-sync", "showtime-sync"]
            .iter()
            .map(|name| SyncJobInfo {
                name: name.to_string(),
                next_invocation: next_runs.get(name).copied(),
            })
            .collect();
        info.sort_by(|a, b| a.name.cmp(&b.name));
        info
    }

    pub fn stop(&self) {
        for handle in self.handles.lock().unwrap().drain(..) {
            handle.abort();
        }
    }
}

impl Drop for SyncJobRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn note_next_run(
    next_runs: &Mutex<HashMap<&'static str, DateTime<Utc>>>,
    name: &'static str,
    period: Duration,
) {
    let next = Utc::now() + chrono::Duration::from_std(period).unwrap_or_else(|_| chrono::Duration::zero());
    next_runs.lock().unwrap().insert(name, next);
}
