//! # TaskHive Worker
//!
//! Background worker for TaskHive. Runs the recurrence sweep on an interval:
//! completed recurring tasks whose next occurrence has arrived are reset to
//! in progress with a fresh due date.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` (required)
//! - `DATABASE_MAX_CONNECTIONS` (default 5)
//! - `SWEEP_INTERVAL_SECS` (default 3600)
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskhive-worker
//! ```

use chrono::Utc;
use taskhive_shared::db;
use taskhive_worker::notify::TracingNotifier;
use taskhive_worker::sweeper;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhive_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("TaskHive Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5);
    let sweep_interval_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3600);

    let pool = db::create_pool(db::DatabaseConfig {
        url: database_url,
        max_connections,
        ..Default::default()
    })
    .await?;

    let notifier = TracingNotifier::new();

    tracing::info!(
        sweep_interval_secs,
        "Worker ready, sweeping recurring tasks"
    );

    // The first tick fires immediately, so one sweep runs at startup and
    // tasks that came due while the worker was down are caught right away.
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(sweep_interval_secs));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = sweeper::sweep(&pool, &notifier, Utc::now()).await {
                    tracing::error!(error = %e, "Recurrence sweep failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received, exiting...");
                break;
            }
        }
    }

    db::pool::close_pool(pool).await;

    Ok(())
}
