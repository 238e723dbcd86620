//! Resman server entry point.
//!
//! Connects to SurrealDB, applies migrations, and keeps project
//! assignment statuses in line with the calendar until shut down.

use std::time::Duration;

use chrono::Utc;
use resman_db::{DbConfig, DbManager, SurrealAssignmentRepository, run_migrations};
use resman_workflow::{SyncConfig, sync_assignment_statuses};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("resman=info".parse()?))
        .json()
        .init();

    tracing::info!("Starting resman server...");

    let db_config = DbConfig::from_env();
    let manager = DbManager::connect(&db_config).await?;
    run_migrations(manager.client()).await?;

    let assignments = SurrealAssignmentRepository::new(manager.client().clone());
    let sync_config = SyncConfig::default();
    let mut ticker = tokio::time::interval(Duration::from_secs(sync_config.interval_secs));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let today = Utc::now().date_naive();
                // A failed run is retried on the next tick.
                if let Err(err) = sync_assignment_statuses(&assignments, today).await {
                    tracing::error!(error = %err, "Assignment status sync failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    tracing::info!("resman server stopped.");
    Ok(())
}
