//! Slot booking HTTP server.
//!
//! Startup order: configuration, tracing, metrics recorder, database pool,
//! migrations, admin bootstrap, router. Shutdown waits for in-flight
//! requests up to `SHUTDOWN_TIMEOUT`.

use slotbook_core::AccountService;
use slotbook_postgres::{PgSlotStore, PgUserStore, run_migrations};
use slotbook_server::{Config, metrics};
use slotbook_web::{AppState, router};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,slotbook=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting slot booking server");

    let config = Config::from_env()?;
    info!(
        listen = %config.server.addr(),
        cancel_policy = %config.booking.cancel_policy,
        lock_timeout_ms = config.postgres.lock_timeout_ms,
        "Configuration loaded"
    );

    let metrics_handle = metrics::install_recorder()?;

    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .min_connections(config.postgres.min_connections)
        .acquire_timeout(config.postgres.connect_timeout())
        .connect(&config.postgres.url)
        .await?;
    run_migrations(&pool).await?;
    info!("Database ready");

    let slots = Arc::new(
        PgSlotStore::new(pool.clone()).with_lock_timeout(config.postgres.lock_timeout()),
    );
    let users = Arc::new(PgUserStore::new(pool.clone()));

    if let Some(admin) = &config.bootstrap_admin {
        let record = AccountService::new(Arc::clone(&users))
            .ensure_admin(&admin.username, &admin.password)
            .await?;
        info!(user_id = %record.id, username = %record.username, "Admin account ensured");
    }

    let state = AppState::new(slots, users)
        .with_cancel_policy(config.booking.cancel_policy)
        .with_metrics(metrics_handle);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.server.addr()).await?;
    info!(address = %config.server.addr(), "Server listening");

    let shutdown = Arc::new(Notify::new());
    let mut server = tokio::spawn({
        let shutdown = Arc::clone(&shutdown);
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
        }
    });

    tokio::select! {
        result = &mut server => {
            result??;
            warn!("Server exited without a shutdown signal");
            pool.close().await;
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    shutdown.notify_one();
    match tokio::time::timeout(config.server.shutdown_timeout(), server).await {
        Ok(result) => result??,
        Err(_) => warn!(
            timeout_secs = config.server.shutdown_timeout,
            "Graceful shutdown timed out, dropping open connections"
        ),
    }

    pool.close().await;
    info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
