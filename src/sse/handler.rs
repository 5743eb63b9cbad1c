//! SSE handler implementation.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use crate::metrics::SseMetrics;
use crate::notification::{LifecycleEvent, Snapshot};
use crate::server::AppState;

/// SSE stream handler
#[tracing::instrument(name = "sse.connect", skip(state))]
pub async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let keep_alive = Duration::from_secs(state.settings.server.keep_alive_interval.max(1));

    tracing::info!("SSE client connected");

    Sse::new(create_sse_stream(state)).keep_alive(
        KeepAlive::new()
            .interval(keep_alive)
            .text("heartbeat"),
    )
}

/// Create the SSE event stream
fn create_sse_stream(state: AppState) -> impl Stream<Item = Result<Event, Infallible>> {
    // Subscribe before reading the snapshot so no change is missed in between
    let mut events = state.notifications.subscribe_events();
    let mut snapshots = state.notifications.subscribe();
    let guard = ConnectionGuard::new();

    async_stream::stream! {
        let _guard = guard;

        let initial = snapshots.borrow_and_update().clone();
        yield Ok(json_event("snapshot", &initial));

        loop {
            let update = tokio::select! {
                received = events.recv() => match received {
                    Ok(event) => StreamUpdate::Lifecycle(event),
                    Err(RecvError::Lagged(skipped)) => StreamUpdate::Lagged(skipped),
                    Err(RecvError::Closed) => StreamUpdate::Closed,
                },
                changed = snapshots.changed() => match changed {
                    Ok(()) => StreamUpdate::Snapshot(snapshots.borrow_and_update().clone()),
                    Err(_) => StreamUpdate::Closed,
                },
            };

            match update {
                StreamUpdate::Lifecycle(event) => {
                    yield Ok(lifecycle_event(&event));
                }
                StreamUpdate::Snapshot(snapshot) => {
                    yield Ok(json_event("snapshot", &snapshot));
                }
                StreamUpdate::Lagged(skipped) => {
                    tracing::warn!(skipped = skipped, "SSE client lagged behind lifecycle events");
                    yield Ok(Event::default().event("lagged").data(skipped.to_string()));
                }
                StreamUpdate::Closed => break,
            }
        }
    }
}

enum StreamUpdate {
    Lifecycle(LifecycleEvent),
    Snapshot(Snapshot),
    Lagged(u64),
    Closed,
}

fn lifecycle_event(event: &LifecycleEvent) -> Event {
    json_event(event.name(), event)
}

fn json_event<T: Serialize>(name: &str, payload: &T) -> Event {
    match serde_json::to_string(payload) {
        Ok(json) => Event::default().event(name).data(json),
        Err(e) => {
            tracing::error!(error = %e, event = name, "Failed to serialize SSE payload");
            Event::default().event("error").data("serialization failed")
        }
    }
}

/// Tracks the connection lifetime for metrics; dropped when the stream ends
struct ConnectionGuard {
    started: Instant,
}

impl ConnectionGuard {
    fn new() -> Self {
        SseMetrics::record_connected();
        Self {
            started: Instant::now(),
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let duration = self.started.elapsed();
        SseMetrics::record_disconnected(duration.as_secs_f64());
        tracing::info!(duration_secs = duration.as_secs(), "SSE client disconnected");
    }
}
