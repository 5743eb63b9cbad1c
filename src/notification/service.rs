//! Notification service task and its handle.
//!
//! The service owns the store and the auto-dismiss timers. Producers talk to
//! it through a cloneable [`NotificationHandle`]; every command and every
//! timer expiry is processed by one loop, so mutations never interleave.
//! After each change the service publishes a fresh [`Snapshot`] on a watch
//! channel and lifecycle events on a broadcast channel.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::NotificationConfig;
use crate::metrics::StoreMetrics;

use super::store::NotificationStore;
use super::timer::{AutoDismissTimers, TimerExpired};
use super::types::{DismissReason, LifecycleEvent, NotificationId, NotificationInput, Position};
use super::window::Snapshot;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The handle outlived the service it was created for
    #[error("Notification service is not running")]
    ServiceStopped,
}

impl<T> From<mpsc::error::SendError<T>> for NotifyError {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        NotifyError::ServiceStopped
    }
}

impl From<oneshot::error::RecvError> for NotifyError {
    fn from(_: oneshot::error::RecvError) -> Self {
        NotifyError::ServiceStopped
    }
}

enum Command {
    Add {
        input: NotificationInput,
        reply: oneshot::Sender<NotificationId>,
    },
    Dismiss {
        id: NotificationId,
        reply: oneshot::Sender<bool>,
    },
    DismissAll {
        reply: oneshot::Sender<usize>,
    },
    SetMaxVisible {
        max_visible: usize,
        reply: oneshot::Sender<()>,
    },
}

/// Counters shared between the service and its handles
#[derive(Debug, Default)]
pub struct ServiceStats {
    pub total_added: AtomicU64,
    pub dismissed_manual: AtomicU64,
    pub dismissed_expired: AtomicU64,
    pub active_timers: AtomicUsize,
}

/// Point-in-time counters, as reported by `/stats`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServiceStatsSnapshot {
    pub total_added: u64,
    pub dismissed_manual: u64,
    pub dismissed_expired: u64,
    pub pending: usize,
    pub visible: usize,
    pub queued: usize,
    pub active_timers: usize,
    pub max_visible: usize,
}

/// Summary of what the service dropped when it stopped
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceReport {
    /// Entries still in the store; their `on_close` callbacks did not run
    pub discarded: usize,
    pub timers_cancelled: usize,
}

pub struct NotificationService {
    store: NotificationStore,
    timers: AutoDismissTimers,
    max_visible: usize,
    position: Position,
    commands: mpsc::Receiver<Command>,
    expired_rx: mpsc::UnboundedReceiver<TimerExpired>,
    snapshots: watch::Sender<Snapshot>,
    events: broadcast::Sender<LifecycleEvent>,
    stats: Arc<ServiceStats>,
    shutdown: broadcast::Receiver<()>,
}

impl NotificationService {
    /// Create the service and the first handle to it.
    ///
    /// The service stops when `shutdown` fires (or its sender is dropped) or
    /// when every handle has been dropped.
    pub fn new(
        config: &NotificationConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> (Self, NotificationHandle) {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (expired_tx, expired_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) =
            watch::channel(Snapshot::empty(config.max_visible, config.position));
        let (event_tx, _) = broadcast::channel(config.event_buffer.max(1));
        let stats = Arc::new(ServiceStats::default());

        let service = Self {
            store: NotificationStore::new(config.default_duration()),
            timers: AutoDismissTimers::new(expired_tx),
            max_visible: config.max_visible,
            position: config.position,
            commands: command_rx,
            expired_rx,
            snapshots: snapshot_tx,
            events: event_tx.clone(),
            stats: stats.clone(),
            shutdown,
        };

        let handle = NotificationHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_tx,
            stats,
        };

        (service, handle)
    }

    /// Create the service and run it on a new tokio task
    pub fn spawn(
        config: &NotificationConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> (NotificationHandle, JoinHandle<ServiceReport>) {
        let (service, handle) = Self::new(config, shutdown);
        let task = tokio::spawn(service.run());
        (handle, task)
    }

    /// Process commands and timer expiries until shutdown
    pub async fn run(mut self) -> ServiceReport {
        tracing::info!(
            max_visible = self.max_visible,
            position = ?self.position,
            default_duration_ms = self.store.default_duration().as_millis() as u64,
            "Notification service started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Notification service received shutdown signal");
                    break;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        tracing::info!("All notification handles dropped");
                        break;
                    }
                },
                Some(expired) = self.expired_rx.recv() => {
                    self.handle_expired(expired);
                }
            }
        }

        let report = self.stop();
        tracing::info!(
            discarded = report.discarded,
            timers_cancelled = report.timers_cancelled,
            "Notification service stopped"
        );
        report
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Add { input, reply } => {
                let id = self.add(input);
                let _ = reply.send(id);
            }
            Command::Dismiss { id, reply } => {
                let dismissed = self.dismiss(id, DismissReason::Manual);
                let _ = reply.send(dismissed);
            }
            Command::DismissAll { reply } => {
                let count = self.dismiss_all();
                let _ = reply.send(count);
            }
            Command::SetMaxVisible { max_visible, reply } => {
                tracing::debug!(
                    previous = self.max_visible,
                    max_visible = max_visible,
                    "Visible window resized"
                );
                self.max_visible = max_visible;
                self.reconcile();
                let _ = reply.send(());
            }
        }
    }

    fn handle_expired(&mut self, expired: TimerExpired) {
        if self.timers.confirm(expired) {
            self.dismiss(expired.id, DismissReason::Expired);
        } else {
            tracing::trace!(
                notification_id = expired.id,
                token = expired.token,
                "Ignoring expiry from cancelled timer"
            );
        }
    }

    fn add(&mut self, input: NotificationInput) -> NotificationId {
        let id = self.store.add(input);
        self.stats.total_added.fetch_add(1, Ordering::Relaxed);

        if let Some(entry) = self.store.get(id) {
            StoreMetrics::record_added(entry.severity);
            self.emit(LifecycleEvent::Added {
                notification: entry.view(),
            });
        }

        self.reconcile();
        id
    }

    fn dismiss(&mut self, id: NotificationId, reason: DismissReason) -> bool {
        if !self.store.dismiss(id) {
            tracing::trace!(notification_id = id, "Dismiss for unknown id ignored");
            return false;
        }

        self.timers.cancel(id);
        self.record_dismissed(id, reason);
        self.reconcile();
        true
    }

    fn dismiss_all(&mut self) -> usize {
        let ids = self.store.dismiss_all();
        for id in &ids {
            self.timers.cancel(*id);
            self.record_dismissed(*id, DismissReason::Manual);
        }
        self.reconcile();
        ids.len()
    }

    fn record_dismissed(&mut self, id: NotificationId, reason: DismissReason) {
        match reason {
            DismissReason::Manual => self.stats.dismissed_manual.fetch_add(1, Ordering::Relaxed),
            DismissReason::Expired => self.stats.dismissed_expired.fetch_add(1, Ordering::Relaxed),
        };
        StoreMetrics::record_dismissed(reason);
        tracing::debug!(notification_id = id, reason = reason.as_str(), "Notification removed");
        self.emit(LifecycleEvent::Dismissed { id, reason });
    }

    /// Recompute the window, align timers with it and publish the snapshot
    fn reconcile(&mut self) {
        let snapshot = Snapshot::from_entries(self.store.snapshot(), self.max_visible, self.position);
        let sync = self.timers.sync(&snapshot.visible);

        for id in &sync.cancelled {
            tracing::debug!(notification_id = id, "Notification pushed back to queue");
        }
        for id in sync.started {
            self.emit(LifecycleEvent::Shown { id });
        }

        let active_timers = self.timers.active_count();
        self.stats.active_timers.store(active_timers, Ordering::Relaxed);
        StoreMetrics::set_window(
            snapshot.visible.len(),
            snapshot.queued.len(),
            active_timers,
        );

        self.snapshots.send_replace(snapshot);
    }

    fn emit(&self, event: LifecycleEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn stop(&mut self) -> ServiceReport {
        let report = ServiceReport {
            timers_cancelled: self.timers.cancel_all(),
            discarded: self.store.discard_all(),
        };
        self.reconcile();
        report
    }
}

/// Cloneable entry point to a running [`NotificationService`]
#[derive(Clone)]
pub struct NotificationHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    events: broadcast::Sender<LifecycleEvent>,
    stats: Arc<ServiceStats>,
}

impl NotificationHandle {
    /// Queue a notification; resolves once the store has assigned its id
    pub async fn add_notification(
        &self,
        input: NotificationInput,
    ) -> Result<NotificationId, NotifyError> {
        self.request(|reply| Command::Add { input, reply }).await
    }

    /// Dismiss by id. Returns `Ok(false)` if the id was not present.
    pub async fn dismiss_notification(&self, id: NotificationId) -> Result<bool, NotifyError> {
        self.request(|reply| Command::Dismiss { id, reply }).await
    }

    /// Dismiss every pending notification, returning how many were removed
    pub async fn dismiss_all(&self) -> Result<usize, NotifyError> {
        self.request(|reply| Command::DismissAll { reply }).await
    }

    pub async fn set_max_visible(&self, max_visible: usize) -> Result<(), NotifyError> {
        self.request(|reply| Command::SetMaxVisible { max_visible, reply })
            .await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    pub fn stats(&self) -> ServiceStatsSnapshot {
        let snapshot = self.snapshots.borrow();
        ServiceStatsSnapshot {
            total_added: self.stats.total_added.load(Ordering::Relaxed),
            dismissed_manual: self.stats.dismissed_manual.load(Ordering::Relaxed),
            dismissed_expired: self.stats.dismissed_expired.load(Ordering::Relaxed),
            pending: snapshot.len(),
            visible: snapshot.visible.len(),
            queued: snapshot.queued.len(),
            active_timers: self.stats.active_timers.load(Ordering::Relaxed),
            max_visible: snapshot.max_visible,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, NotifyError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands.send(command(reply_tx)).await?;
        Ok(reply_rx.await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn config(max_visible: usize) -> NotificationConfig {
        NotificationConfig {
            max_visible,
            ..Default::default()
        }
    }

    fn visible_priorities(handle: &NotificationHandle) -> Vec<i32> {
        handle.snapshot().visible.iter().map(|n| n.priority).collect()
    }

    #[tokio::test]
    async fn test_add_publishes_snapshot() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (handle, task) = NotificationService::spawn(&config(3), shutdown_rx);

        let id = handle
            .add_notification(NotificationInput::new("Enrolled in Rust 101"))
            .await
            .unwrap();

        let snapshot = handle.snapshot();
        assert!(snapshot.is_visible(id));
        assert_eq!(snapshot.visible[0].duration_ms, 6000);

        shutdown_tx.send(()).unwrap();
        let report = task.await.unwrap();
        assert_eq!(report.discarded, 1);
        assert_eq!(report.timers_cancelled, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_promotion() {
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (handle, _task) = NotificationService::spawn(&config(2), shutdown_rx);

        let mut ids = Vec::new();
        for p in 1..=4 {
            ids.push(
                handle
                    .add_notification(NotificationInput::new(format!("p{}", p)).priority(p))
                    .await
                    .unwrap(),
            );
        }
        assert_eq!(visible_priorities(&handle), vec![4, 3]);

        assert!(handle.dismiss_notification(ids[3]).await.unwrap());
        assert_eq!(visible_priorities(&handle), vec![3, 2]);
        assert_eq!(handle.stats().active_timers, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_twice_fires_on_close_once() {
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (handle, _task) = NotificationService::spawn(&config(3), shutdown_rx);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let id = handle
            .add_notification(NotificationInput::new("x").on_close(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(handle.dismiss_notification(id).await.unwrap());
        assert!(!handle.dismiss_notification(id).await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.stats().dismissed_manual, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_max_visible_starts_timers() {
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (handle, _task) = NotificationService::spawn(&config(1), shutdown_rx);

        for i in 0..3 {
            handle
                .add_notification(NotificationInput::new(format!("n{}", i)))
                .await
                .unwrap();
        }
        assert_eq!(handle.stats().active_timers, 1);

        handle.set_max_visible(3).await.unwrap();
        let stats = handle.stats();
        assert_eq!(stats.visible, 3);
        assert_eq!(stats.queued, 0);
        assert_eq!(stats.active_timers, 3);
        assert_eq!(stats.max_visible, 3);
    }

    #[tokio::test]
    async fn test_handle_after_shutdown_fails() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (handle, task) = NotificationService::spawn(&config(3), shutdown_rx);

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();

        assert!(!handle.is_running());
        let err = handle
            .add_notification(NotificationInput::new("late"))
            .await
            .unwrap_err();
        assert_eq!(err, NotifyError::ServiceStopped);
        assert!(matches!(
            handle.dismiss_notification(0).await,
            Err(NotifyError::ServiceStopped)
        ));
    }

    #[tokio::test]
    async fn test_service_stops_when_handles_dropped() {
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (handle, task) = NotificationService::spawn(&config(3), shutdown_rx);
        drop(handle);

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("service should stop")
            .expect("service should not panic");
    }
}
