//! Route definitions for the Medika Clinic API.

use axum::{
    routing::{get, put},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Create API routes, one group per UI tab.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Dashboard & reports
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/reports/sales", get(handlers::dashboard::sales_report))
        // Patients
        .route(
            "/patients",
            get(handlers::patient::list_patients).post(handlers::patient::create_patient),
        )
        .route(
            "/patients/:id",
            get(handlers::patient::get_patient)
                .put(handlers::patient::update_patient)
                .delete(handlers::patient::delete_patient),
        )
        // Medicines (the alerts route must stay above the :id routes in
        // spirit; axum resolves the static segment first)
        .route(
            "/medicines",
            get(handlers::medicine::list_medicines).post(handlers::medicine::create_medicine),
        )
        .route("/medicines/alerts", get(handlers::medicine::medicine_alerts))
        .route(
            "/medicines/:id",
            get(handlers::medicine::get_medicine)
                .put(handlers::medicine::update_medicine)
                .delete(handlers::medicine::delete_medicine),
        )
        .route("/medicines/:id/stock", put(handlers::stock::adjust_stock))
        // Stock ledger
        .route(
            "/stock-movements",
            get(handlers::stock::list_stock_movements).post(handlers::stock::create_stock_movement),
        )
        // Services
        .route(
            "/services",
            get(handlers::service::list_services).post(handlers::service::create_service),
        )
        .route(
            "/services/:id",
            get(handlers::service::get_service)
                .put(handlers::service::update_service)
                .delete(handlers::service::delete_service),
        )
        // Transactions
        .route(
            "/transactions",
            get(handlers::transaction::list_transactions)
                .post(handlers::transaction::create_transaction),
        )
        .route(
            "/transactions/:id",
            get(handlers::transaction::get_transaction),
        )
        .route(
            "/transactions/:id/status",
            put(handlers::transaction::update_transaction_status),
        )
        .route(
            "/transactions/:id/notes",
            put(handlers::transaction::add_transaction_notes),
        )
        // Visits
        .route(
            "/visits",
            get(handlers::visit::list_visits).post(handlers::visit::create_visit),
        )
        // Settings
        .route("/settings", get(handlers::settings::list_settings))
        .route("/settings/:key", put(handlers::settings::update_setting))
}

/// Health check endpoint handler.
pub async fn health() -> &'static str {
    "ok"
}
