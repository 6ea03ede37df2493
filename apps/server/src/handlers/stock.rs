//! # Stock Handlers
//!
//! Manual ledger operations: recording movements, absolute stock
//! adjustments, and browsing the audit log.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;
use medika_core::{NewMovement, StockMovement};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMovementsQuery {
    pub medicine_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    pub quantity: i64,
    pub notes: Option<String>,
}

/// `POST /api/stock-movements`
pub async fn create_stock_movement(
    State(state): State<AppState>,
    Json(input): Json<NewMovement>,
) -> ApiResult<Json<StockMovement>> {
    debug!(
        medicine_id = %input.medicine_id,
        movement_type = input.movement_type.as_str(),
        quantity = %input.quantity,
        "create_stock_movement"
    );

    let movement = state.db.stock().create_movement(&input).await?;
    Ok(Json(movement))
}

/// `GET /api/stock-movements?medicineId=`
///
/// Returns movements newest first.
pub async fn list_stock_movements(
    State(state): State<AppState>,
    Query(query): Query<ListMovementsQuery>,
) -> ApiResult<Json<Vec<StockMovement>>> {
    let movements = state.db.stock().list(query.medicine_id.as_deref()).await?;
    Ok(Json(movements))
}

/// `PUT /api/medicines/:id/stock`
///
/// Sets absolute stock; the ledger records the signed delta. A no-change
/// adjustment records nothing.
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(medicine_id): Path<String>,
    Json(request): Json<AdjustStockRequest>,
) -> ApiResult<StatusCode> {
    debug!(medicine_id = %medicine_id, quantity = %request.quantity, "adjust_stock");

    state
        .db
        .stock()
        .set_stock_level(&medicine_id, request.quantity, request.notes.as_deref())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
