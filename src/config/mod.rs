use std::env;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::models::PremiumPricing;
use crate::services::SyncJobsConfig;
use crate::utils::retry::RetryPolicy;

pub mod cors;

pub use cors::create_cors_layer;

pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// How long before a showtime the reminder fires.
    pub reminder_lead: chrono::Duration,
    pub premium_pricing: PremiumPricing,
    /// Grid used when self-healing legacy showtimes with no seat universe.
    pub seat_grid: (u32, u32),
    pub sync_retry: RetryPolicy,
    pub sync_jobs: SyncJobsConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/marquee".to_string()),
            port: parse_env("PORT", 3001),
            reminder_lead: chrono::Duration::hours(parse_env("REMINDER_HOURS_BEFORE", 24)),
            premium_pricing: premium_pricing_from_env(),
            seat_grid: (
                parse_env("SEAT_GRID_ROWS", 10),
                parse_env("SEAT_GRID_COLS", 10),
            ),
            sync_retry: RetryPolicy {
                max_attempts: parse_env("SYNC_MAX_ATTEMPTS", 3),
                initial_delay: Duration::from_millis(parse_env("SYNC_INITIAL_DELAY_MS", 1000)),
            },
            sync_jobs: SyncJobsConfig {
                enabled: env::var("ENABLE_AUTO_SYNC")
                    .map(|v| v.to_lowercase() == "true")
                    .unwrap_or(false),
                movie_sync_interval: Duration::from_secs(parse_env(
                    "MOVIE_SYNC_INTERVAL_SECS",
                    86_400,
                )),
                showtime_sync_interval: Duration::from_secs(parse_env(
                    "SHOWTIME_SYNC_INTERVAL_SECS",
                    86_400,
                )),
                showtime_sync_horizon_days: parse_env("SHOWTIME_SYNC_HORIZON_DAYS", 30),
            },
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

/// One premium rule for every pricing call site: a flat surcharge wins when
/// configured, otherwise the multiplier (default x1.3).
fn premium_pricing_from_env() -> PremiumPricing {
    if let Ok(value) = env::var("PREMIUM_PRICE_SURCHARGE") {
        match value.parse::<Decimal>() {
            Ok(amount) => return PremiumPricing::Surcharge(amount),
            Err(_) => {
                tracing::warn!(%value, "invalid PREMIUM_PRICE_SURCHARGE, falling back")
            }
        }
    }
    if let Ok(value) = env::var("PREMIUM_PRICE_MULTIPLIER") {
        match value.parse::<Decimal>() {
            Ok(multiplier) => return PremiumPricing::Multiplier(multiplier),
            Err(_) => {
                tracing::warn!(%value, "invalid PREMIUM_PRICE_MULTIPLIER, falling back")
            }
        }
    }
    PremiumPricing::default()
}
