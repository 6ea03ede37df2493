//! # Application State
//!
//! Shared state handed to every handler. The `Database` handle is a thin
//! wrapper over the connection pool, so cloning per request is cheap.

use medika_db::Database;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}
