// Domain layer
pub mod notification;

// Application layer
pub mod api;
pub mod server;
pub mod sse;

// Supporting modules
pub mod config;
pub mod error;
pub mod metrics;
pub mod shutdown;
pub mod telemetry;
