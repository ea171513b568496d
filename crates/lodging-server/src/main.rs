//! Lodging Server - Main entry point

use std::{future::IntoFuture, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use lodging_common::logging::{init_logging, LogConfig};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use lodging_server::{
    admission::{spawn_flush_task, AdmissionController},
    api::{self, AppState},
    config::Config,
    db::{self, PgStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("lodging-server")
        .filter_directives("lodging_server=debug,tower_http=debug,sqlx=warn")
        .build();

    // Environment variables take precedence over the defaults above
    let log_config = LogConfig::from_env_with(log_config)?;
    let _log_guard = init_logging(&log_config)?;

    info!("Starting Lodging Server");

    let config = Config::load()?;
    info!(
        environment = %config.server.environment,
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let pool = db::create_pool(&config.database).await?;
    info!("Database connection pool established");

    let admission = Arc::new(AdmissionController::from_config(&config.rate_limit)?);
    let flush = spawn_flush_task(Arc::clone(&admission), admission.flush_interval())?;
    info!(
        rps = config.rate_limit.requests_per_second,
        burst = config.rate_limit.burst,
        "Rate limiting enabled"
    );

    let state = AppState {
        store: Arc::new(PgStore::new(pool.clone())),
        admission,
        credentials: Arc::new(config.auth.clone()),
        query_timeout: config.server.query_timeout(),
    };

    let app = api::create_router(state, &config.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let draining = CancellationToken::new();
    let drain_signal = draining.clone();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { drain_signal.cancelled().await })
    .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        _ = shutdown_signal() => {
            draining.cancel();
            let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
            info!("Waiting up to {} seconds for connections to close", grace.as_secs());
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result?,
                Err(_) => warn!("Shutdown timeout elapsed with connections still open"),
            }
        },
    }

    flush.shutdown().await;
    pool.close().await;

    info!("Server shut down gracefully");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
