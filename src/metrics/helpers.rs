use prometheus::{Encoder, TextEncoder};

use crate::notification::{DismissReason, Severity};

use super::{
    NOTIFICATIONS_ADDED_TOTAL, NOTIFICATIONS_DISMISSED_TOTAL, NOTIFICATIONS_QUEUED,
    NOTIFICATIONS_VISIBLE, ON_CLOSE_PANICS_TOTAL, SSE_CLIENTS, SSE_CONNECTION_DURATION,
    TIMERS_ACTIVE,
};

/// Encode all registered metrics in Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording store metrics
pub struct StoreMetrics;

impl StoreMetrics {
    pub fn record_added(severity: Severity) {
        NOTIFICATIONS_ADDED_TOTAL
            .with_label_values(&[severity.as_str()])
            .inc();
    }

    pub fn record_dismissed(reason: DismissReason) {
        NOTIFICATIONS_DISMISSED_TOTAL
            .with_label_values(&[reason.as_str()])
            .inc();
    }

    pub fn record_on_close_panic() {
        ON_CLOSE_PANICS_TOTAL.inc();
    }

    /// Update the window gauges after the window was recomputed
    pub fn set_window(visible: usize, queued: usize, active_timers: usize) {
        NOTIFICATIONS_VISIBLE.set(visible as i64);
        NOTIFICATIONS_QUEUED.set(queued as i64);
        TIMERS_ACTIVE.set(active_timers as i64);
    }
}

/// Helper struct for SSE client metrics
pub struct SseMetrics;

impl SseMetrics {
    pub fn record_connected() {
        SSE_CLIENTS.inc();
    }

    pub fn record_disconnected(duration_secs: f64) {
        SSE_CLIENTS.dec();
        SSE_CONNECTION_DURATION.observe(duration_secs);
    }
}
