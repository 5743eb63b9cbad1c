//! Ordered in-memory notification store.
//!
//! The store owns the pending notifications and the id counter. Entries are
//! kept sorted by priority (highest first); entries of equal priority keep
//! their insertion order. None of the operations fail: missing optional
//! fields fall back to defaults and dismissing an unknown id does nothing.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use super::types::{Notification, NotificationId, NotificationInput, NotificationView};

/// Fallback auto-dismiss duration when neither the producer nor the config sets one
pub const DEFAULT_DURATION: Duration = Duration::from_millis(6000);

pub struct NotificationStore {
    entries: Vec<Notification>,
    next_id: NotificationId,
    default_duration: Duration,
}

impl NotificationStore {
    pub fn new(default_duration: Duration) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            default_duration,
        }
    }

    pub fn default_duration(&self) -> Duration {
        self.default_duration
    }

    /// Insert a notification and return the id assigned to it.
    pub fn add(&mut self, input: NotificationInput) -> NotificationId {
        let id = self.next_id;
        self.next_id += 1;

        let notification = Notification {
            id,
            message: input.message,
            title: input.title,
            severity: input.severity.unwrap_or_default(),
            duration: input.duration.unwrap_or(self.default_duration),
            priority: input.priority.unwrap_or(0),
            on_close: input.on_close,
        };

        tracing::debug!(
            notification_id = id,
            priority = notification.priority,
            severity = notification.severity.as_str(),
            duration_ms = notification.duration.as_millis() as u64,
            "Notification added"
        );

        self.entries.push(notification);
        // Stable: equal priorities keep insertion order
        self.entries.sort_by(|a, b| b.priority.cmp(&a.priority));

        id
    }

    /// Dismiss a notification by id.
    ///
    /// Fires the entry's `on_close` callback before removing it. Returns
    /// `false` when no entry has that id.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        let Some(index) = self.entries.iter().position(|n| n.id == id) else {
            return false;
        };

        if let Some(callback) = self.entries[index].on_close.take() {
            run_on_close(id, callback);
        }

        self.entries.remove(index);
        tracing::debug!(notification_id = id, remaining = self.entries.len(), "Notification dismissed");
        true
    }

    /// Dismiss every entry in store order, returning the dismissed ids.
    pub fn dismiss_all(&mut self) -> Vec<NotificationId> {
        let ids: Vec<NotificationId> = self.entries.iter().map(|n| n.id).collect();
        for id in &ids {
            self.dismiss(*id);
        }
        ids
    }

    /// Remove everything without firing callbacks.
    ///
    /// Used on shutdown, where entries are discarded rather than dismissed.
    pub fn discard_all(&mut self) -> usize {
        let discarded = self.entries.len();
        self.entries.clear();
        discarded
    }

    /// Point-in-time copy of the ordered entries
    pub fn snapshot(&self) -> Vec<NotificationView> {
        self.entries.iter().map(Notification::view).collect()
    }

    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.entries.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}

fn run_on_close(id: NotificationId, callback: super::types::OnClose) {
    if panic::catch_unwind(AssertUnwindSafe(callback)).is_err() {
        crate::metrics::StoreMetrics::record_on_close_panic();
        tracing::warn!(notification_id = id, "on_close callback panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Severity;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn priorities(store: &NotificationStore) -> Vec<i32> {
        store.snapshot().iter().map(|n| n.priority).collect()
    }

    #[test]
    fn test_priority_ordering() {
        let mut store = NotificationStore::default();
        store.add(NotificationInput::new("low").priority(1));
        store.add(NotificationInput::new("high").priority(10));
        store.add(NotificationInput::new("mid").priority(5));

        assert_eq!(priorities(&store), vec![10, 5, 1]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut store = NotificationStore::default();
        let a = store.add(NotificationInput::new("a").priority(2));
        let b = store.add(NotificationInput::new("b"));
        let c = store.add(NotificationInput::new("c").priority(2));
        let d = store.add(NotificationInput::new("d"));

        let ids: Vec<_> = store.snapshot().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![a, c, b, d]);
    }

    #[test]
    fn test_ids_distinct_and_increasing() {
        let mut store = NotificationStore::default();
        let ids: Vec<_> = (0..50)
            .map(|i| store.add(NotificationInput::new(format!("n{}", i)).priority(i % 7)))
            .collect();

        assert_eq!(ids[0], 0);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ids_not_reused_after_dismiss() {
        let mut store = NotificationStore::default();
        let first = store.add(NotificationInput::new("first"));
        store.dismiss(first);
        let second = store.add(NotificationInput::new("second"));

        assert_ne!(first, second);
        assert!(second > first);
    }

    #[test]
    fn test_separate_stores_have_separate_counters() {
        let mut a = NotificationStore::default();
        let mut b = NotificationStore::default();
        a.add(NotificationInput::new("a0"));
        a.add(NotificationInput::new("a1"));

        assert_eq!(b.add(NotificationInput::new("b0")), 0);
    }

    #[test]
    fn test_defaults_applied() {
        let mut store = NotificationStore::new(Duration::from_millis(4000));
        let id = store.add(NotificationInput::new("plain"));

        let entry = store.get(id).unwrap();
        assert_eq!(entry.duration, Duration::from_millis(4000));
        assert_eq!(entry.severity, Severity::Info);
        assert_eq!(entry.priority, 0);
        assert!(entry.title.is_none());
        assert!(!entry.has_on_close());
    }

    #[test]
    fn test_explicit_duration_kept() {
        let mut store = NotificationStore::default();
        let id = store.add(NotificationInput::new("short").duration(Duration::from_millis(2000)));

        assert_eq!(store.get(id).unwrap().duration, Duration::from_millis(2000));
    }

    #[test]
    fn test_dismiss_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut store = NotificationStore::default();
        let id = store.add(NotificationInput::new("bye").on_close(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(store.dismiss(id));
        assert!(!store.dismiss(id));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_dismiss_unknown_id_is_noop() {
        let mut store = NotificationStore::default();
        store.add(NotificationInput::new("stay"));

        assert!(!store.dismiss(42));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_on_close_runs_before_removal() {
        let mut store = NotificationStore::default();
        let seen = Arc::new(AtomicUsize::new(0));
        let flag = seen.clone();
        let id = store.add(NotificationInput::new("x").on_close(move || {
            flag.store(1, Ordering::SeqCst);
        }));
        store.add(NotificationInput::new("y"));

        store.dismiss(id);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(!store.contains(id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_panicking_on_close_does_not_break_store() {
        let mut store = NotificationStore::default();
        let id = store.add(NotificationInput::new("boom").on_close(|| panic!("callback failure")));
        store.add(NotificationInput::new("other"));

        assert!(store.dismiss(id));
        assert_eq!(store.len(), 1);
        assert!(!store.contains(id));
    }

    #[test]
    fn test_dismiss_all_fires_every_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut store = NotificationStore::default();
        for i in 0..4 {
            let counter = calls.clone();
            store.add(NotificationInput::new(format!("n{}", i)).on_close(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }

        let dismissed = store.dismiss_all();
        assert_eq!(dismissed.len(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(store.is_empty());
    }

    #[test]
    fn test_discard_all_skips_callbacks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut store = NotificationStore::default();
        store.add(NotificationInput::new("gone").on_close(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(store.discard_all(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut store = NotificationStore::default();
        let id = store.add(NotificationInput::new("first"));
        let before = store.snapshot();

        store.dismiss(id);
        assert_eq!(before.len(), 1);
        assert!(store.snapshot().is_empty());
    }
}
