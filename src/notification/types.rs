use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Identifier assigned by the store at insertion time
pub type NotificationId = u64;

/// Callback fired once when a notification is dismissed
pub type OnClose = Box<dyn FnOnce() + Send + 'static>;

/// Severity of a notification, used by the rendering layer for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    /// Applied when a producer does not specify a severity
    #[default]
    Info,
    Success,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Success => "success",
        }
    }
}

/// Screen anchor for the toast stack.
///
/// The service never interprets it; it is forwarded to subscribers as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
}

/// Why a notification left the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DismissReason {
    /// Explicit dismiss call (user or program)
    Manual,
    /// Auto-dismiss timer ran out
    Expired,
}

impl DismissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DismissReason::Manual => "manual",
            DismissReason::Expired => "expired",
        }
    }
}

/// Producer-side description of a notification.
///
/// Everything except `message` is optional; the store resolves missing
/// fields to defaults at insertion time.
pub struct NotificationInput {
    pub message: String,
    pub title: Option<String>,
    pub severity: Option<Severity>,
    pub duration: Option<Duration>,
    pub priority: Option<i32>,
    pub on_close: Option<OnClose>,
}

impl NotificationInput {
    /// Create an input with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            title: None,
            severity: None,
            duration: None,
            priority: None,
            on_close: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message).severity(Severity::Error)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message).severity(Severity::Warning)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message).severity(Severity::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message).severity(Severity::Success)
    }

    /// Set the heading
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the severity
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Set how long the notification stays on screen once visible
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Set the priority (higher is shown first)
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Register a callback fired when the notification is dismissed
    pub fn on_close<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_close = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for NotificationInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationInput")
            .field("message", &self.message)
            .field("title", &self.title)
            .field("severity", &self.severity)
            .field("duration", &self.duration)
            .field("priority", &self.priority)
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

/// A notification held by the store, with all defaults resolved
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub title: Option<String>,
    pub severity: Severity,
    pub duration: Duration,
    pub priority: i32,
    pub(crate) on_close: Option<OnClose>,
}

impl Notification {
    /// Plain-data copy of this entry, without the callback
    pub fn view(&self) -> NotificationView {
        NotificationView {
            id: self.id,
            message: self.message.clone(),
            title: self.title.clone(),
            severity: self.severity,
            duration_ms: self.duration.as_millis() as u64,
            priority: self.priority,
        }
    }

    pub fn has_on_close(&self) -> bool {
        self.on_close.is_some()
    }
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("id", &self.id)
            .field("message", &self.message)
            .field("title", &self.title)
            .field("severity", &self.severity)
            .field("duration", &self.duration)
            .field("priority", &self.priority)
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

/// Read-only view of a notification handed to renderers and subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationView {
    pub id: NotificationId,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub severity: Severity,
    pub duration_ms: u64,
    pub priority: i32,
}

impl NotificationView {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Lifecycle events broadcast by the notification service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Entry inserted into the store (it may still be queued)
    Added { notification: NotificationView },
    /// Entry entered the visible window and its timer started
    Shown { id: NotificationId },
    /// Entry removed from the store
    Dismissed {
        id: NotificationId,
        reason: DismissReason,
    },
}

impl LifecycleEvent {
    /// Event name used on the SSE stream
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Added { .. } => "added",
            LifecycleEvent::Shown { .. } => "shown",
            LifecycleEvent::Dismissed { .. } => "dismissed",
        }
    }
}
