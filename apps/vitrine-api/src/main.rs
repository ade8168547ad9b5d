//! # Vitrine API
//!
//! Entry point: opens the catalog, starts the sync scheduler and serves HTTP.
//!
//! ## Usage
//! ```text
//! vitrine-api            # serve HTTP, sync in the background
//! vitrine-api sync-once  # run one sync cycle and exit
//! ```

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vitrine_api::{router, ApiConfig, AppState, CatalogSearch, LogFormat};
use vitrine_db::{Database, DbConfig};
use vitrine_sync::scheduler::run_once;
use vitrine_sync::{Reconciler, SyncConfig, SyncScheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::load()?;
    init_tracing(config.log_format);

    info!("Starting Vitrine API...");

    let sync_config = SyncConfig::load(None)?;
    info!(
        port = config.http_port,
        database = %config.database_path.display(),
        sync_enabled = config.sync_enabled,
        "Configuration loaded"
    );

    if config.server_api_key.is_none() {
        warn!("SERVER_API_KEY is not set, every tool call will be refused");
    }

    let db = Database::new(DbConfig::new(&config.database_path))
        .await
        .context("failed to open the catalog database")?;
    info!("Catalog database ready");

    let reconciler = Arc::new(Reconciler::from_config(db.clone(), &sync_config)?);

    if std::env::args().nth(1).as_deref() == Some("sync-once") {
        let outcome = run_once(&reconciler).await;
        db.close().await;
        return match outcome {
            Some(_) => Ok(()),
            None => anyhow::bail!("sync cycle failed"),
        };
    }

    let scheduler = config
        .sync_enabled
        .then(|| SyncScheduler::new(reconciler.clone(), &sync_config.schedule).spawn());

    let state = Arc::new(AppState {
        search: CatalogSearch::new(db.clone(), sync_config.scoring_params()?),
        db: db.clone(),
        api_key: config.server_api_key.clone(),
    });

    let addr = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Starting HTTP server");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vitrine=debug,sqlx=warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
