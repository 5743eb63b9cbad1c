//! Auto-dismiss timers for visible notifications.
//!
//! Each visible entry owns one one-shot timer. Starting a timer returns a
//! [`TimerHandle`]; cancelling or dropping the handle aborts the timer task,
//! so a cancelled timer never reports an expiry.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::types::{NotificationId, NotificationView};

/// Message sent by a timer when it runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerExpired {
    pub id: NotificationId,
    /// Distinguishes successive timers started for the same id
    pub token: u64,
}

/// Cancellation handle for a running timer
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Spawn a one-shot timer that reports `expired` on `tx` after `duration`.
    pub fn start(
        duration: Duration,
        expired: TimerExpired,
        tx: mpsc::UnboundedSender<TimerExpired>,
    ) -> Self {
        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tx.send(expired);
        });
        Self { task }
    }

    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct ActiveTimer {
    token: u64,
    handle: TimerHandle,
}

/// Changes applied by [`AutoDismissTimers::sync`]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TimerSync {
    /// Ids that entered the window and got a timer
    pub started: Vec<NotificationId>,
    /// Ids that left the window and lost their timer
    pub cancelled: Vec<NotificationId>,
}

/// Registry of active auto-dismiss timers, at most one per id
pub struct AutoDismissTimers {
    active: HashMap<NotificationId, ActiveTimer>,
    next_token: u64,
    expired_tx: mpsc::UnboundedSender<TimerExpired>,
}

impl AutoDismissTimers {
    pub fn new(expired_tx: mpsc::UnboundedSender<TimerExpired>) -> Self {
        Self {
            active: HashMap::new(),
            next_token: 0,
            expired_tx,
        }
    }

    /// Start a timer for `id` unless one is already running.
    ///
    /// Returns `true` if a new timer was started.
    pub fn start(&mut self, id: NotificationId, duration: Duration) -> bool {
        if self.active.contains_key(&id) {
            return false;
        }

        let token = self.next_token;
        self.next_token += 1;

        let handle = TimerHandle::start(
            duration,
            TimerExpired { id, token },
            self.expired_tx.clone(),
        );
        self.active.insert(id, ActiveTimer { token, handle });

        tracing::trace!(
            notification_id = id,
            duration_ms = duration.as_millis() as u64,
            "Auto-dismiss timer started"
        );
        true
    }

    /// Cancel the timer for `id`, if any
    pub fn cancel(&mut self, id: NotificationId) -> bool {
        match self.active.remove(&id) {
            Some(timer) => {
                timer.handle.cancel();
                tracing::trace!(notification_id = id, "Auto-dismiss timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Bring the timers in line with the visible window.
    ///
    /// Visible entries without a timer get one; timers of entries that are no
    /// longer visible are cancelled.
    pub fn sync(&mut self, visible: &[NotificationView]) -> TimerSync {
        let mut result = TimerSync::default();

        let stale: Vec<NotificationId> = self
            .active
            .keys()
            .filter(|id| !visible.iter().any(|n| n.id == **id))
            .copied()
            .collect();
        for id in stale {
            self.cancel(id);
            result.cancelled.push(id);
        }

        for entry in visible {
            if self.start(entry.id, entry.duration()) {
                result.started.push(entry.id);
            }
        }

        result
    }

    /// Accept an expiry if it comes from the timer currently registered for its id.
    ///
    /// Expiries from timers that were cancelled after they fired are rejected.
    pub fn confirm(&mut self, expired: TimerExpired) -> bool {
        match self.active.get(&expired.id) {
            Some(timer) if timer.token == expired.token => {
                self.active.remove(&expired.id);
                true
            }
            _ => false,
        }
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.active.len();
        self.active.clear();
        count
    }

    pub fn is_active(&self, id: NotificationId) -> bool {
        self.active.contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Severity;

    fn view(id: NotificationId, duration_ms: u64) -> NotificationView {
        NotificationView {
            id,
            message: format!("n{}", id),
            title: None,
            severity: Severity::Info,
            duration_ms,
            priority: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_duration() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = AutoDismissTimers::new(tx);
        let start = tokio::time::Instant::now();

        assert!(timers.start(1, Duration::from_millis(2000)));
        let expired = rx.recv().await.unwrap();

        assert_eq!(expired.id, 1);
        assert!(start.elapsed() >= Duration::from_millis(2000));
        assert!(start.elapsed() < Duration::from_millis(2010));
        assert!(timers.confirm(expired));
        assert!(!timers.is_active(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = AutoDismissTimers::new(tx);

        timers.start(1, Duration::from_millis(100));
        assert!(timers.cancel(1));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(timers.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_double_start() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = AutoDismissTimers::new(tx);

        assert!(timers.start(3, Duration::from_millis(100)));
        assert!(!timers.start(3, Duration::from_millis(100)));
        assert_eq!(timers.active_count(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        tokio_test::assert_ok!(rx.try_recv());
        tokio_test::assert_err!(rx.try_recv());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_follows_window() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut timers = AutoDismissTimers::new(tx);

        let first = timers.sync(&[view(1, 1000), view(2, 1000)]);
        assert_eq!(first.started, vec![1, 2]);
        assert!(first.cancelled.is_empty());

        // 2 pushed out by 3, 1 keeps its running timer
        let second = timers.sync(&[view(3, 1000), view(1, 1000)]);
        assert_eq!(second.started, vec![3]);
        assert_eq!(second.cancelled, vec![2]);
        assert!(timers.is_active(1));
        assert!(!timers.is_active(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_expiry_rejected() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = AutoDismissTimers::new(tx);

        timers.start(5, Duration::from_millis(100));
        let first = rx.recv().await.unwrap();

        // The entry left and re-entered the window before the expiry was handled
        timers.cancel(5);
        timers.start(5, Duration::from_millis(100));

        assert!(!timers.confirm(first));
        assert!(timers.is_active(5));

        let second = rx.recv().await.unwrap();
        assert!(timers.confirm(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_aborts() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = TimerHandle::start(
            Duration::from_millis(50),
            TimerExpired { id: 9, token: 0 },
            tx,
        );
        drop(handle);

        tokio::time::sleep(Duration::from_millis(100)).await;
        // Sender was owned by the aborted task, so the channel is closed and empty
        assert!(rx.recv().await.is_none());
    }
}
