use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use marquee_server::config::Config;
use marquee_server::external::{CatalogProvider, LogNotifier, Notifier, NullCatalog};
use marquee_server::routes::create_routes;
use marquee_server::services::{
    BookingService, CinemaSyncService, ConsistencyChecker, ReminderScheduler, ShowtimeService,
    SyncJobRunner,
};
use marquee_server::state::AppState;
use marquee_server::store::{CinemaStore, PgStore};
use marquee_server::utils::metrics::SyncMetrics;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    let store: Arc<dyn CinemaStore> = Arc::new(PgStore::new(pool));
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let catalog: Arc<dyn CatalogProvider> = Arc::new(NullCatalog);
    let metrics = SyncMetrics::new();

    let reminders = ReminderScheduler::new(store.clone(), notifier.clone(), config.reminder_lead);
    // In-memory reminder jobs do not survive a restart; rebuild them from
    // confirmed bookings with future showtimes
    reminders.restore().await;

    let bookings = Arc::new(BookingService::new(
        store.clone(),
        notifier.clone(),
        reminders.clone(),
        config.premium_pricing,
        config.seat_grid,
    ));
    let showtimes = Arc::new(ShowtimeService::new(store.clone()));
    let sync = Arc::new(CinemaSyncService::new(
        store.clone(),
        catalog,
        metrics.clone(),
        config.sync_retry,
    ));
    let sync_jobs = Arc::new(SyncJobRunner::new(sync.clone(), config.sync_jobs.clone()));
    sync_jobs.start();
    let consistency = Arc::new(ConsistencyChecker::new(store.clone()));

    let state = AppState {
        bookings,
        showtimes,
        reminders,
        sync,
        sync_jobs,
        consistency,
        metrics,
    };

    let app = create_routes(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
