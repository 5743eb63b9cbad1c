//! Visible-window derivation.

use serde::{Deserialize, Serialize};

use super::types::{NotificationId, NotificationView, Position};

/// Default number of notifications rendered at once
pub const DEFAULT_MAX_VISIBLE: usize = 3;

/// First `max_visible` entries of an already sorted slice
pub fn visible_window<T>(entries: &[T], max_visible: usize) -> &[T] {
    &entries[..entries.len().min(max_visible)]
}

/// Rendered state of the store at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Entries inside the window, in display order
    pub visible: Vec<NotificationView>,
    /// Entries waiting for a slot, in the order they will be admitted
    pub queued: Vec<NotificationView>,
    pub max_visible: usize,
    pub position: Position,
}

impl Snapshot {
    pub fn empty(max_visible: usize, position: Position) -> Self {
        Self {
            visible: Vec::new(),
            queued: Vec::new(),
            max_visible,
            position,
        }
    }

    /// Split sorted store entries into the visible window and the queue
    pub fn from_entries(
        mut entries: Vec<NotificationView>,
        max_visible: usize,
        position: Position,
    ) -> Self {
        let split = visible_window(&entries, max_visible).len();
        let queued = entries.split_off(split);
        Self {
            visible: entries,
            queued,
            max_visible,
            position,
        }
    }

    pub fn visible_ids(&self) -> Vec<NotificationId> {
        self.visible.iter().map(|n| n.id).collect()
    }

    pub fn is_visible(&self, id: NotificationId) -> bool {
        self.visible.iter().any(|n| n.id == id)
    }

    pub fn is_queued(&self, id: NotificationId) -> bool {
        self.queued.iter().any(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.visible.len() + self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty() && self.queued.is_empty()
    }
}
