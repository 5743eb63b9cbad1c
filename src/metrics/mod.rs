//! Prometheus metrics for the notification service.
//!
//! - Store metrics (added by severity, dismissed by reason)
//! - Window metrics (visible, queued, running timers)
//! - SSE client metrics

mod helpers;

pub use helpers::{encode_metrics, SseMetrics, StoreMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "toast";

lazy_static! {
    // ============================================================================
    // Store Metrics
    // ============================================================================

    /// Notifications added, by severity
    pub static ref NOTIFICATIONS_ADDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_added_total", METRIC_PREFIX),
        "Total notifications added to the store",
        &["severity"]
    ).unwrap();

    /// Notifications dismissed, by reason (manual or expired)
    pub static ref NOTIFICATIONS_DISMISSED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_dismissed_total", METRIC_PREFIX),
        "Total notifications dismissed",
        &["reason"]
    ).unwrap();

    /// on_close callbacks that panicked
    pub static ref ON_CLOSE_PANICS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_on_close_panics_total", METRIC_PREFIX),
        "Total on_close callbacks that panicked"
    ).unwrap();

    // ============================================================================
    // Window Metrics
    // ============================================================================

    /// Notifications currently inside the visible window
    pub static ref NOTIFICATIONS_VISIBLE: IntGauge = register_int_gauge!(
        format!("{}_notifications_visible", METRIC_PREFIX),
        "Notifications currently visible"
    ).unwrap();

    /// Notifications waiting outside the window
    pub static ref NOTIFICATIONS_QUEUED: IntGauge = register_int_gauge!(
        format!("{}_notifications_queued", METRIC_PREFIX),
        "Notifications waiting for a visible slot"
    ).unwrap();

    /// Running auto-dismiss timers
    pub static ref TIMERS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_timers_active", METRIC_PREFIX),
        "Auto-dismiss timers currently running"
    ).unwrap();

    // ============================================================================
    // SSE Metrics
    // ============================================================================

    /// Connected SSE clients
    pub static ref SSE_CLIENTS: IntGauge = register_int_gauge!(
        format!("{}_sse_clients", METRIC_PREFIX),
        "Connected SSE stream clients"
    ).unwrap();

    /// SSE connection duration
    pub static ref SSE_CONNECTION_DURATION: Histogram = register_histogram!(
        format!("{}_sse_connection_duration_seconds", METRIC_PREFIX),
        "SSE connection duration in seconds",
        vec![1.0, 10.0, 60.0, 300.0, 1800.0, 3600.0]
    ).unwrap();
}
