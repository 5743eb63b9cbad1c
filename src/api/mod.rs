//! API layer - HTTP endpoint handlers.

mod health;
mod metrics;
mod notifications;
mod routes;

pub use health::{health, stats};
pub use metrics::prometheus_metrics;
pub use notifications::{
    create_notification, dismiss_all, dismiss_notification, get_notification, list_notifications,
    set_window, CreateNotificationRequest, CreateNotificationResponse, DismissAllResponse,
    DismissResponse, NotificationStatusResponse, WindowRequest,
};
pub use routes::api_routes;
