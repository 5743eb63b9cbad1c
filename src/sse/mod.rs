//! Server-Sent Events stream of the notification queue.
//!
//! # Endpoint
//!
//! `GET /api/v1/notifications/stream`
//!
//! # Event Types
//!
//! - `snapshot` - full snapshot; sent on connect and after every change
//! - `added` - a notification entered the store
//! - `shown` - a notification entered the visible window
//! - `dismissed` - a notification left the store (`reason`: manual or expired)
//! - `lagged` - the client fell behind and missed events; a snapshot follows

mod handler;

pub use handler::sse_handler;
