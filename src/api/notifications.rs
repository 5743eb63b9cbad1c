//! Notification queue endpoints.

use std::time::Duration;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::notification::{NotificationId, NotificationInput, NotificationView, Severity, Snapshot};
use crate::server::AppState;

/// Body of `POST /api/v1/notifications`
#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    pub message: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub priority: Option<i32>,
}

impl CreateNotificationRequest {
    /// Validate and convert into a store input
    pub fn into_input(self) -> Result<NotificationInput> {
        if self.message.trim().is_empty() {
            return Err(AppError::Validation("message must not be empty".to_string()));
        }

        let mut input = NotificationInput::new(self.message);
        input.title = self.title.filter(|t| !t.trim().is_empty());
        input.severity = self.severity;
        input.duration = self.duration_ms.map(Duration::from_millis);
        input.priority = self.priority;
        Ok(input)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateNotificationResponse {
    pub id: NotificationId,
    /// Whether the notification went straight into the visible window
    pub visible: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DismissResponse {
    pub id: NotificationId,
    /// `false` when the id was not (or no longer) in the store
    pub dismissed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DismissAllResponse {
    pub dismissed: usize,
}

#[derive(Debug, Deserialize)]
pub struct WindowRequest {
    pub max_visible: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationStatusResponse {
    pub notification: NotificationView,
    /// "visible" or "queued"
    pub state: String,
}

/// GET /api/v1/notifications - current snapshot
pub async fn list_notifications(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.notifications.snapshot())
}

/// GET /api/v1/notifications/{id}
pub async fn get_notification(
    State(state): State<AppState>,
    path: std::result::Result<Path<NotificationId>, PathRejection>,
) -> Result<Json<NotificationStatusResponse>> {
    let Path(id) = path?;
    let snapshot = state.notifications.snapshot();

    let found = snapshot
        .visible
        .into_iter()
        .find(|n| n.id == id)
        .map(|n| (n, "visible"))
        .or_else(|| {
            snapshot
                .queued
                .into_iter()
                .find(|n| n.id == id)
                .map(|n| (n, "queued"))
        });

    match found {
        Some((notification, entry_state)) => Ok(Json(NotificationStatusResponse {
            notification,
            state: entry_state.to_string(),
        })),
        None => Err(AppError::NotFound(format!("Notification {} not found", id))),
    }
}

/// POST /api/v1/notifications
#[tracing::instrument(
    name = "http.create_notification",
    skip(state, request),
    fields(priority = ?request.priority, severity = ?request.severity)
)]
pub async fn create_notification(
    State(state): State<AppState>,
    Json(request): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<CreateNotificationResponse>)> {
    let input = request.into_input()?;
    let id = state.notifications.add_notification(input).await?;
    let visible = state.notifications.snapshot().is_visible(id);

    tracing::info!(notification_id = id, visible = visible, "Notification created via HTTP");

    Ok((
        StatusCode::CREATED,
        Json(CreateNotificationResponse {
            id,
            visible,
            created_at: Utc::now(),
        }),
    ))
}

/// DELETE /api/v1/notifications/{id}
#[tracing::instrument(
    name = "http.dismiss_notification",
    skip(state, path),
    fields(notification_id = tracing::field::Empty)
)]
pub async fn dismiss_notification(
    State(state): State<AppState>,
    path: std::result::Result<Path<NotificationId>, PathRejection>,
) -> Result<Json<DismissResponse>> {
    let Path(id) = path?;
    tracing::Span::current().record("notification_id", id);
    let dismissed = state.notifications.dismiss_notification(id).await?;
    Ok(Json(DismissResponse { id, dismissed }))
}

/// DELETE /api/v1/notifications
#[tracing::instrument(name = "http.dismiss_all", skip(state))]
pub async fn dismiss_all(State(state): State<AppState>) -> Result<Json<DismissAllResponse>> {
    let dismissed = state.notifications.dismiss_all().await?;
    tracing::info!(dismissed = dismissed, "All notifications dismissed via HTTP");
    Ok(Json(DismissAllResponse { dismissed }))
}

/// PUT /api/v1/notifications/window
#[tracing::instrument(
    name = "http.set_window",
    skip(state, request),
    fields(max_visible = request.max_visible)
)]
pub async fn set_window(
    State(state): State<AppState>,
    Json(request): Json<WindowRequest>,
) -> Result<Json<Snapshot>> {
    state
        .notifications
        .set_max_visible(request.max_visible)
        .await?;
    Ok(Json(state.notifications.snapshot()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_into_input() {
        let request: CreateNotificationRequest = serde_json::from_value(serde_json::json!({
            "message": "Assignment graded",
            "severity": "success",
            "duration_ms": 2000,
            "priority": 4
        }))
        .unwrap();

        let input = request.into_input().unwrap();
        assert_eq!(input.message, "Assignment graded");
        assert_eq!(input.severity, Some(Severity::Success));
        assert_eq!(input.duration, Some(Duration::from_millis(2000)));
        assert_eq!(input.priority, Some(4));
        assert!(input.title.is_none());
    }

    #[test]
    fn test_blank_message_rejected() {
        let request = CreateNotificationRequest {
            message: "   ".to_string(),
            title: None,
            severity: None,
            duration_ms: None,
            priority: None,
        };

        assert!(matches!(request.into_input(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_unknown_severity_rejected_by_serde() {
        let result: std::result::Result<CreateNotificationRequest, _> =
            serde_json::from_value(serde_json::json!({"message": "x", "severity": "fatal"}));
        assert!(result.is_err());
    }
}
