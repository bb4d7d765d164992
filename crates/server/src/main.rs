//! RateMyModule server entry point.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use ratemymodule_common::{AppError, AppResult, Config};
use ratemymodule_core::Services;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde::Serialize;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
struct AppState {
    db: Arc<DatabaseConnection>,
    services: Services,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    unsolved_reports: u64,
}

async fn health(State(state): State<AppState>) -> AppResult<Json<Health>> {
    state
        .db
        .ping()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    let unsolved_reports = state.services.reports.count_unsolved().await?;

    Ok(Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        unsolved_reports,
    }))
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ratemymodule=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting RateMyModule server...");

    let config = Config::load()?;

    let mut db_opts = ConnectOptions::new(&config.database.url);
    db_opts
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections);

    let db = Database::connect(db_opts).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    ratemymodule_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);
    let services = Services::new(db.clone(), &config);
    let state = AppState { db, services };

    let app = Router::new()
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
