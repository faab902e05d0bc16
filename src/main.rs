//! Keyed Cache - workload driver
//!
//! Runs a concurrent workload against both caches and logs a JSON report.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keyed_cache::{spawn_workload, Config, ConcurrentCache, RecencyCache};

/// Main entry point for the workload driver.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Create both caches
/// 4. Run the workload until it completes or a shutdown signal arrives
/// 5. Log the run report as JSON
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyed_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Keyed Cache workload driver");

    let config = Config::from_env();
    config
        .validate()
        .context("invalid workload configuration")?;
    info!(
        "Configuration loaded: cache_capacity={}, workers={}, operations_per_worker={}, key_space={}",
        config.cache_capacity, config.worker_count, config.operations_per_worker, config.key_space
    );

    let recency = Arc::new(
        RecencyCache::new(config.cache_capacity).context("failed to create recency cache")?,
    );
    let concurrent = Arc::new(ConcurrentCache::new());
    let stop = Arc::new(AtomicBool::new(false));

    let mut workload = spawn_workload(recency, concurrent, &config, stop.clone());

    let report = tokio::select! {
        report = &mut workload => report.context("workload task failed")?,
        _ = shutdown_signal() => {
            stop.store(true, Ordering::Relaxed);
            warn!("Stopping workers early");
            workload.await.context("workload task failed")?
        }
    };

    info!("Run report: {}", serde_json::to_string(&report)?);
    info!("Workload driver shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
