use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::notification::NotificationHandle;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub notifications: NotificationHandle,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings, notifications: NotificationHandle) -> Self {
        Self {
            settings: Arc::new(settings),
            notifications,
            start_time: Instant::now(),
        }
    }
}
