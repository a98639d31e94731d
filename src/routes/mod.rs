use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::create_cors_layer;
use crate::handlers::{self, bookings, ops, showtimes};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/api/bookings",
            post(bookings::create_booking).get(bookings::list_bookings),
        )
        .route("/api/bookings/user/my-bookings", get(bookings::my_bookings))
        .route("/api/bookings/:id", get(bookings::get_booking))
        .route("/api/bookings/:id/cancel", put(bookings::cancel_booking))
        .route(
            "/api/showtimes",
            post(showtimes::create_showtime).get(showtimes::list_showtimes),
        )
        .route(
            "/api/showtimes/:id/pricing",
            patch(showtimes::reprice_showtime),
        )
        .route(
            "/api/showtimes/:id/reschedule",
            put(showtimes::reschedule_showtime),
        )
        .route("/api/ops/reminders", get(ops::reminder_jobs))
        .route("/api/ops/sync/movies", post(ops::trigger_movie_sync))
        .route("/api/ops/sync/showtimes", post(ops::trigger_showtime_sync))
        .route("/api/ops/sync/metrics", get(ops::sync_metrics))
        .route("/api/ops/sync/jobs", get(ops::sync_jobs))
        .route("/api/ops/consistency", get(ops::consistency_check))
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer())
        .with_state(state)
}
