//! # Taskboard API Server
//!
//! REST backend for users and their task items.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (and `.env`)
//! 2. Connect to PostgreSQL and apply migrations, or use in-memory storage
//!    when `TASKBOARD_STORAGE=memory`
//! 3. Serve until Ctrl-C or SIGTERM, then cancel in-flight requests and
//!    close the pool
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskboard-api
//! ```

use anyhow::Context;
use taskboard_api::{
    app::{build_router, AppState},
    config::{Config, StorageBackend},
};
use taskboard_shared::{
    db::{migrations, pool},
    repository::InMemoryStore,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    let state = match config.storage {
        StorageBackend::Postgres => {
            if config.run_migrations {
                migrations::ensure_database_exists(&config.database.url)
                    .await
                    .context("failed to create database")?;
            }

            let db = pool::create_pool(config.database.pool_config())
                .await
                .context("failed to connect to PostgreSQL")?;

            if config.run_migrations {
                migrations::run_migrations(&db)
                    .await
                    .context("failed to apply migrations")?;

                let status = migrations::migration_status(&db).await?;
                tracing::info!(
                    applied = status.applied_migrations,
                    latest_version = ?status.latest_version,
                    "Schema ready"
                );
            }

            AppState::new(db, config)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost when the server stops");
            AppState::in_memory(InMemoryStore::new(), config)
        }
    };

    let shutdown = state.shutdown.clone();
    let db = state.db.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    if let Some(db) = db {
        pool::close_pool(db).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "taskboard_api=debug,taskboard_shared=debug,tower_http=debug".into()
    });
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Resolves on Ctrl-C or SIGTERM and cancels every request token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received, cancelling in-flight requests...");
    token.cancel();
}
