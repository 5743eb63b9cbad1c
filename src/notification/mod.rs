//! Priority toast queue.
//!
//! # Architecture
//!
//! - [`NotificationStore`]: ordered collection (priority descending, insertion
//!   order for ties) that assigns ids and fires `on_close` callbacks.
//! - [`visible_window`] / [`Snapshot`]: the first `max_visible` entries are
//!   rendered, the rest wait in the queue.
//! - [`AutoDismissTimers`]: one cancellable timer per visible entry.
//! - [`NotificationService`]: task owning all of the above; producers use a
//!   [`NotificationHandle`].
//!
//! An entry moves `Queued -> Visible -> Dismissed`. A visible entry pushed
//! out by a higher-priority arrival goes back to `Queued` and loses its timer.

mod service;
mod store;
mod timer;
mod types;
mod window;

pub use service::{
    NotificationHandle, NotificationService, NotifyError, ServiceReport, ServiceStats,
    ServiceStatsSnapshot,
};
pub use store::{NotificationStore, DEFAULT_DURATION};
pub use timer::{AutoDismissTimers, TimerExpired, TimerHandle, TimerSync};
pub use types::{
    DismissReason, LifecycleEvent, Notification, NotificationId, NotificationInput,
    NotificationView, OnClose, Position, Severity,
};
pub use window::{visible_window, Snapshot, DEFAULT_MAX_VISIBLE};
