//! Pawsync daemon - keeps the offline queue flowing to the API.
//!
//! Opens the local SQLite store, probes the API health endpoint for
//! connectivity, and runs the sync scheduler until interrupted.

use std::sync::Arc;

use pawsync_client::{
    Config, Connectivity, ConnectivityMonitor, HandlerRegistry, HttpProbe, HttpTransport,
    SqliteStore, SyncEvent, SyncService,
};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pawsync_client=debug,pawsync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting pawsync against {}", config.api_url);

    let store = Arc::new(SqliteStore::connect(&config.database_url).await?);
    let transport = Arc::new(HttpTransport::new(&config.api_url, config.request_timeout)?);
    let monitor = ConnectivityMonitor::new(Connectivity::Disconnected);

    let service = SyncService::builder(store.clone(), HandlerRegistry::rest(transport))
        .config(config.sync.clone())
        .connectivity(monitor.clone())
        .build()
        .await?;

    let handle = service.start();

    let probe = HttpProbe::new(config.health_url(), config.probe_interval)?;
    let probe_task = tokio::spawn(probe.run(monitor));
    let events_task = tokio::spawn(log_events(service.clone()));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    probe_task.abort();
    events_task.abort();
    handle.shutdown().await;
    store.close().await;

    Ok(())
}

async fn log_events(service: SyncService) {
    let mut events = service.subscribe();
    loop {
        match events.recv().await {
            Ok(SyncEvent::OperationCompleted { operation, .. }) => {
                tracing::debug!(op_id = %operation.id, "Event: operation completed");
            }
            Ok(SyncEvent::OperationFailed { operation, error }) => {
                tracing::warn!(op_id = %operation.id, %error, "Event: operation failed");
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event log lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
