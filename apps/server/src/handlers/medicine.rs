//! # Medicine Handlers
//!
//! Catalog CRUD plus the alert feed. Opening stock on creation goes through
//! the ledger (an `in` movement), never a direct column write, so even the
//! first unit is traceable.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use medika_core::{validation, Medicine, MovementType, NewMovement};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMedicinesQuery {
    pub search: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicineRequest {
    pub name: String,
    pub unit: String,
    pub price_cents: i64,
    #[serde(default)]
    pub initial_stock: i64,
    #[serde(default)]
    pub minimum_stock: i64,
    pub expiry_date: Option<NaiveDate>,
    pub supplier: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedicineRequest {
    pub name: String,
    pub unit: String,
    pub price_cents: i64,
    pub minimum_stock: i64,
    pub expiry_date: Option<NaiveDate>,
    pub supplier: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineAlerts {
    pub low_stock: Vec<Medicine>,
    pub expiring_soon: Vec<Medicine>,
}

/// `GET /api/medicines`
pub async fn list_medicines(
    State(state): State<AppState>,
    Query(query): Query<ListMedicinesQuery>,
) -> ApiResult<Json<Vec<Medicine>>> {
    let search = match &query.search {
        Some(raw) => Some(validation::validate_search_query(raw)?),
        None => None,
    };

    let medicines = state
        .db
        .medicines()
        .list(search.as_deref(), query.limit.unwrap_or(100))
        .await?;

    Ok(Json(medicines))
}

/// `POST /api/medicines`
pub async fn create_medicine(
    State(state): State<AppState>,
    Json(request): Json<CreateMedicineRequest>,
) -> ApiResult<Json<Medicine>> {
    validation::validate_name(&request.name)?;
    validation::validate_unit(&request.unit)?;
    validation::validate_price_cents(request.price_cents)?;
    if request.initial_stock < 0 || request.minimum_stock < 0 {
        return Err(ApiError::validation("stock quantities cannot be negative"));
    }

    let now = Utc::now();
    let medicine = Medicine {
        id: Uuid::new_v4().to_string(),
        name: request.name.trim().to_string(),
        unit: request.unit.trim().to_string(),
        price_cents: request.price_cents,
        stock_quantity: 0,
        minimum_stock: request.minimum_stock,
        expiry_date: request.expiry_date,
        supplier: request.supplier,
        created_at: now,
        updated_at: now,
    };

    state.db.medicines().insert(&medicine).await?;

    if request.initial_stock > 0 {
        state
            .db
            .stock()
            .create_movement(&NewMovement {
                medicine_id: medicine.id.clone(),
                movement_type: MovementType::In,
                quantity: request.initial_stock,
                reference_id: None,
                notes: Some("initial stock".to_string()),
            })
            .await?;
    }

    let medicine = state
        .db
        .medicines()
        .get_by_id(&medicine.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Medicine", &medicine.id))?;

    Ok(Json(medicine))
}

/// `GET /api/medicines/alerts`
///
/// Low-stock medicines plus anything expiring within the next 90 days.
pub async fn medicine_alerts(State(state): State<AppState>) -> ApiResult<Json<MedicineAlerts>> {
    let low_stock = state.db.medicines().low_stock().await?;

    let horizon = Utc::now().date_naive() + Duration::days(90);
    let expiring_soon = state.db.medicines().expiring_before(horizon).await?;

    Ok(Json(MedicineAlerts {
        low_stock,
        expiring_soon,
    }))
}

/// `GET /api/medicines/:id`
pub async fn get_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Medicine>> {
    let medicine = state
        .db
        .medicines()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Medicine", &id))?;

    Ok(Json(medicine))
}

/// `PUT /api/medicines/:id`
///
/// Catalog fields only; stock changes go through the ledger endpoints.
pub async fn update_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMedicineRequest>,
) -> ApiResult<Json<Medicine>> {
    validation::validate_name(&request.name)?;
    validation::validate_unit(&request.unit)?;
    validation::validate_price_cents(request.price_cents)?;

    let mut medicine = state
        .db
        .medicines()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Medicine", &id))?;

    medicine.name = request.name.trim().to_string();
    medicine.unit = request.unit.trim().to_string();
    medicine.price_cents = request.price_cents;
    medicine.minimum_stock = request.minimum_stock;
    medicine.expiry_date = request.expiry_date;
    medicine.supplier = request.supplier;

    state.db.medicines().update(&medicine).await?;

    let medicine = state
        .db
        .medicines()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Medicine", &id))?;

    Ok(Json(medicine))
}

/// `DELETE /api/medicines/:id`
pub async fn delete_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.medicines().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
