//! # Transaction Handlers
//!
//! The point-of-sale RPC surface. Validation and atomicity live in
//! `medika_db::repository::transaction`; these handlers only shape the
//! HTTP boundary.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use medika_core::{NewTransaction, PaymentStatus, Transaction, TransactionDetail};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    pub patient_id: Option<String>,
    pub status: Option<PaymentStatus>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: PaymentStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesRequest {
    pub notes: String,
}

/// `POST /api/transactions`
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(input): Json<NewTransaction>,
) -> ApiResult<Json<TransactionDetail>> {
    debug!(patient_id = %input.patient_id, "create_transaction");

    let detail = state.db.transactions().create(&input).await?;
    Ok(Json(detail))
}

/// `GET /api/transactions`
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListTransactionsQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let transactions = state
        .db
        .transactions()
        .list(
            query.patient_id.as_deref(),
            query.status,
            query.limit.unwrap_or(100),
        )
        .await?;

    Ok(Json(transactions))
}

/// `GET /api/transactions/:id`
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TransactionDetail>> {
    let detail = state
        .db
        .transactions()
        .get_detail(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction", &id))?;

    Ok(Json(detail))
}

/// `PUT /api/transactions/:id/status`
pub async fn update_transaction_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Transaction>> {
    debug!(transaction_id = %id, status = request.status.as_str(), "update_transaction_status");

    let transaction = state
        .db
        .transactions()
        .update_status(&id, request.status)
        .await?;

    Ok(Json(transaction))
}

/// `PUT /api/transactions/:id/notes`
pub async fn add_transaction_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<NotesRequest>,
) -> ApiResult<Json<Transaction>> {
    let transaction = state
        .db
        .transactions()
        .add_notes(&id, &request.notes)
        .await?;

    Ok(Json(transaction))
}
