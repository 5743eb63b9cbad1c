use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use toast_notification_service::config::Settings;
use toast_notification_service::notification::NotificationService;
use toast_notification_service::server::{create_app, AppState};
use toast_notification_service::shutdown::{shutdown_signal, GracefulShutdown};
use toast_notification_service::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    telemetry::init_tracing(&settings.log)?;
    tracing::info!("Configuration loaded");

    // Start the notification service
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let (notifications, service_task) =
        NotificationService::spawn(&settings.notifications, shutdown_tx.subscribe());

    // Create application state
    let state = AppState::new(settings.clone(), notifications);
    tracing::info!("Application state initialized");

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown; the signal also stops the service,
    // which closes open SSE streams
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx.clone()))
        .await?;

    GracefulShutdown::new(shutdown_tx, service_task)
        .execute("server stopped")
        .await;

    tracing::info!("Server shutdown complete");
    Ok(())
}
