//! # Medika Clinic API Server
//!
//! Entry point for the clinic backend: a JSON API over HTTP consumed by the
//! tab-based web UI.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (env filter, `RUST_LOG` override)
//! 2. Load `.env` and read configuration from the environment
//! 3. Connect to SQLite (WAL mode), run pending migrations
//! 4. Seed missing default settings (idempotent, per-key)
//! 5. Build the router and serve
//!
//! ## Configuration
//! - `MEDIKA_DB_PATH` - SQLite file path (default `./data/medika.db`)
//! - `MEDIKA_PORT`    - listen port (default 8080)

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use medika_db::{Database, DbConfig};

mod error;
mod handlers;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    dotenvy::dotenv().ok();

    info!("Starting Medika Clinic API server");

    let db_path = database_path()?;
    info!(path = %db_path.display(), "Database path determined");

    let db = Database::new(DbConfig::new(db_path)).await?;
    info!("Database connected and migrations applied");

    db.settings().ensure_defaults().await?;
    info!("Default settings ensured");

    let state = AppState::new(db);
    let app = create_app(state);

    let port: u16 = std::env::var("MEDIKA_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware.
fn create_app(state: AppState) -> Router {
    // The UI is served from its own origin during development.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - show debug messages
/// - `RUST_LOG=medika_db=trace` - trace for the database layer only
/// - Default: INFO, with debug for our crates and warnings for sqlx
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,medika_db=debug,medika_server=debug,sqlx=warn")
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Determines the database file path.
///
/// `MEDIKA_DB_PATH` overrides the default `./data/medika.db`; the parent
/// directory is created when missing.
fn database_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = std::env::var("MEDIKA_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data/medika.db"));

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    Ok(path)
}
