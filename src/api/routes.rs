use axum::{
    routing::{get, put},
    Router,
};

use crate::server::AppState;
use crate::sse::sse_handler;

use super::health::{health, stats};
use super::metrics::prometheus_metrics;
use super::notifications::{
    create_notification, dismiss_all, dismiss_notification, get_notification, list_notifications,
    set_window,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health, Stats & Metrics
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Notification endpoints
        .nest(
            "/api/v1",
            Router::new()
                .route(
                    "/notifications",
                    get(list_notifications)
                        .post(create_notification)
                        .delete(dismiss_all),
                )
                .route("/notifications/window", put(set_window))
                .route("/notifications/stream", get(sse_handler))
                .route(
                    "/notifications/{id}",
                    get(get_notification).delete(dismiss_notification),
                ),
        )
}
