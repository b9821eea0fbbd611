//! DeviceVault Backend Server
//!
//! Serves wallet authentication and the device intake API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;

use devicevault_server::app::{build_router, configure_cors};
use devicevault_server::auth::AuthSettings;
use devicevault_server::clock::SystemClock;
use devicevault_server::config::Config;
use devicevault_server::db;
use devicevault_server::maintenance::spawn_maintenance;
use devicevault_server::middleware::RateLimiter;
use devicevault_server::repos::Repositories;
use devicevault_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = %config.environment.as_str(), "Starting DeviceVault server");

    let repos = match config.database_url {
        Some(_) => {
            let pool = db::create_pool(&config).await?;
            db::run_migrations(&pool).await?;
            Repositories::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (data is lost on restart)");
            Repositories::in_memory()
        }
    };

    let state = AppState::new(
        repos,
        config.jwt_secret.clone(),
        AuthSettings::from(&config),
        RateLimiter::new(config.rate_limit_rps),
        Arc::new(SystemClock),
    );

    let maintenance = spawn_maintenance(state.clone());

    let app = build_router(
        state,
        configure_cors(config.cors_allowed_origins.as_deref()),
        config.environment,
    );

    let addr = SocketAddr::new(config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    maintenance.abort();
    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
