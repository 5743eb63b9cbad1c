//! Graceful shutdown handling for the notification service.
//!
//! Shutdown runs in two phases:
//! 1. Broadcast the shutdown signal so the service loop and SSE streams stop
//! 2. Wait (bounded) for the service task to cancel its timers and report

use std::time::{Duration, Instant};

use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::notification::ServiceReport;

/// Configuration for graceful shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Time to wait for the service task to stop (default: 5 seconds)
    pub service_stop_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            service_stop_timeout: Duration::from_secs(5),
        }
    }
}

/// Result of a graceful shutdown operation
#[derive(Debug, Default)]
pub struct ShutdownResult {
    /// Whether the service task stopped within the timeout
    pub success: bool,
    /// Notifications still pending when the service stopped
    pub discarded: usize,
    /// Timers cancelled while stopping
    pub timers_cancelled: usize,
    /// Total time taken for shutdown
    pub duration: Duration,
}

/// Coordinates stopping the notification service task
pub struct GracefulShutdown {
    shutdown_tx: broadcast::Sender<()>,
    service_task: JoinHandle<ServiceReport>,
    config: ShutdownConfig,
}

impl GracefulShutdown {
    pub fn new(shutdown_tx: broadcast::Sender<()>, service_task: JoinHandle<ServiceReport>) -> Self {
        Self::with_config(shutdown_tx, service_task, ShutdownConfig::default())
    }

    pub fn with_config(
        shutdown_tx: broadcast::Sender<()>,
        service_task: JoinHandle<ServiceReport>,
        config: ShutdownConfig,
    ) -> Self {
        Self {
            shutdown_tx,
            service_task,
            config,
        }
    }

    /// Execute the shutdown sequence
    #[tracing::instrument(name = "graceful_shutdown", skip(self))]
    pub async fn execute(self, reason: &str) -> ShutdownResult {
        let start = Instant::now();
        let mut result = ShutdownResult::default();

        tracing::info!(reason = %reason, "Starting graceful shutdown - Phase 1: Signaling service");
        // Err only means the service already stopped
        let _ = self.shutdown_tx.send(());

        tracing::info!("Phase 2: Waiting for notification service to stop");
        let mut service_task = self.service_task;
        match timeout(self.config.service_stop_timeout, &mut service_task).await {
            Ok(Ok(report)) => {
                result.success = true;
                result.discarded = report.discarded;
                result.timers_cancelled = report.timers_cancelled;
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Notification service task failed");
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.service_stop_timeout.as_millis() as u64,
                    "Notification service did not stop in time, aborting"
                );
                service_task.abort();
            }
        }

        result.duration = start.elapsed();
        tracing::info!(
            success = result.success,
            discarded = result.discarded,
            timers_cancelled = result.timers_cancelled,
            duration_ms = result.duration.as_millis() as u64,
            "Graceful shutdown completed"
        );

        result
    }
}

/// Resolve on Ctrl+C or SIGTERM, then broadcast the shutdown signal
pub async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    let _ = shutdown_tx.send(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationConfig;
    use crate::notification::{NotificationInput, NotificationService};

    #[tokio::test]
    async fn test_shutdown_reports_discarded() {
        let (tx, rx) = broadcast::channel(1);
        let (handle, task) = NotificationService::spawn(&NotificationConfig::default(), rx);

        for i in 0..5 {
            handle
                .add_notification(NotificationInput::new(format!("pending {}", i)))
                .await
                .unwrap();
        }

        let result = GracefulShutdown::new(tx, task).execute("test shutdown").await;

        assert!(result.success);
        assert_eq!(result.discarded, 5);
        assert_eq!(result.timers_cancelled, 3);
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_after_service_already_stopped() {
        let (tx, rx) = broadcast::channel(1);
        let (handle, task) = NotificationService::spawn(&NotificationConfig::default(), rx);
        drop(handle);

        let result = GracefulShutdown::new(tx, task).execute("test shutdown").await;
        assert!(result.success);
        assert_eq!(result.discarded, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_service_is_aborted_after_timeout() {
        let (tx, _rx) = broadcast::channel(1);
        let stuck = tokio::spawn(std::future::pending::<ServiceReport>());
        let config = ShutdownConfig {
            service_stop_timeout: Duration::from_millis(50),
        };

        let result = GracefulShutdown::with_config(tx, stuck, config)
            .execute("test shutdown")
            .await;

        assert!(!result.success);
        assert_eq!(result.discarded, 0);
        assert_eq!(result.timers_cancelled, 0);
    }

    #[test]
    fn test_shutdown_config_defaults() {
        let config = ShutdownConfig::default();
        assert_eq!(config.service_stop_timeout, Duration::from_secs(5));
    }
}
