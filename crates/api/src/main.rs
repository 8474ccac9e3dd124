use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use keygate_api::background;
use keygate_api::config::{ServerConfig, StoreBackend};
use keygate_api::router::build_app_router;
use keygate_api::state::AppState;
use keygate_db::stores::{
    InMemoryRevocationStore, InMemoryUserDirectory, PgRevocationStore, PgUserDirectory,
    RevocationStore, UserDirectory,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keygate_api=debug,keygate_db=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Config ---
    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        backend = ?config.store_backend,
        jwt_expiry_mins = config.jwt.expiry_mins,
        "Configuration loaded"
    );

    // --- Stores ---
    let (users, revocations) = open_stores(&config).await?;

    // --- Background jobs ---
    let prune_cancel = CancellationToken::new();
    let prune_handle = tokio::spawn(background::revocation_prune::run(
        Arc::clone(&revocations),
        Duration::from_secs(config.revocation_prune_interval_secs),
        prune_cancel.clone(),
    ));

    // --- Server ---
    let addr = SocketAddr::new(
        config.host.parse().context("HOST is not a valid IP address")?,
        config.port,
    );
    let state = AppState::new(config.clone(), users, revocations);
    let app = build_app_router(state, &config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Starting server on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    prune_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), prune_handle).await;
    tracing::info!("Revocation prune job stopped");

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Construct the user directory and revocation store for the configured backend.
async fn open_stores(
    config: &ServerConfig,
) -> anyhow::Result<(Arc<dyn UserDirectory>, Arc<dyn RevocationStore>)> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the postgres backend")?;

            let pool = keygate_db::create_pool(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connection pool created");

            keygate_db::health_check(&pool)
                .await
                .context("Database health check failed")?;
            tracing::info!("Database health check passed");

            keygate_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            Ok((
                Arc::new(PgUserDirectory::new(pool.clone())),
                Arc::new(PgRevocationStore::new(pool)),
            ))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory stores; all accounts and revocations are lost on exit");
            Ok((
                Arc::new(InMemoryUserDirectory::new()),
                Arc::new(InMemoryRevocationStore::new()),
            ))
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
