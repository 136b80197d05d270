//! Beacon map API server.
//!
//! Loads [`Settings`], connects to PostgreSQL, applies migrations and serves
//! the API until Ctrl-C or SIGTERM. Pass `--in-memory` to run without a
//! database; nothing is persisted in that mode.

use anyhow::Context;
use api::{db, router, AppState, Settings};
use store::{MemoryStore, Store};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let settings = Settings::new().context("Failed to load settings")?;

    if std::env::args().any(|arg| arg == "--in-memory") {
        info!("Running with the in-memory store");
        return serve(MemoryStore::new(), &settings).await;
    }

    let pool = db::connect(&settings.database)
        .await
        .context("Failed to connect to database")?;
    db::migrate(&pool)
        .await
        .context("Failed to run migrations")?;
    serve(db::PgStore::new(pool), &settings).await
}

async fn serve<S: Store>(store: S, settings: &Settings) -> anyhow::Result<()> {
    let state = AppState::new(store, settings).context("Invalid auth.token_key")?;
    let app = router(state);

    let addr = settings
        .server
        .address()
        .context("Invalid server.host or server.port")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutdown signal received");
}
