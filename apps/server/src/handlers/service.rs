//! # Service Handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use medika_core::{validation, Service};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListServicesQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteServiceResponse {
    /// False when the service was deactivated instead because sales
    /// reference it.
    pub deleted: bool,
}

/// `GET /api/services`
pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ListServicesQuery>,
) -> ApiResult<Json<Vec<Service>>> {
    let services = state.db.services().list(query.active_only).await?;
    Ok(Json(services))
}

/// `POST /api/services`
pub async fn create_service(
    State(state): State<AppState>,
    Json(request): Json<ServiceRequest>,
) -> ApiResult<Json<Service>> {
    validation::validate_name(&request.name)?;
    validation::validate_price_cents(request.price_cents)?;

    let now = Utc::now();
    let service = Service {
        id: Uuid::new_v4().to_string(),
        name: request.name.trim().to_string(),
        description: request.description,
        price_cents: request.price_cents,
        is_active: request.is_active,
        created_at: now,
        updated_at: now,
    };

    let service = state.db.services().insert(&service).await?;
    Ok(Json(service))
}

/// `GET /api/services/:id`
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Service>> {
    let service = state
        .db
        .services()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service", &id))?;

    Ok(Json(service))
}

/// `PUT /api/services/:id`
pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ServiceRequest>,
) -> ApiResult<Json<Service>> {
    validation::validate_name(&request.name)?;
    validation::validate_price_cents(request.price_cents)?;

    let mut service = state
        .db
        .services()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service", &id))?;

    service.name = request.name.trim().to_string();
    service.description = request.description;
    service.price_cents = request.price_cents;
    service.is_active = request.is_active;

    state.db.services().update(&service).await?;

    let service = state
        .db
        .services()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service", &id))?;

    Ok(Json(service))
}

/// `DELETE /api/services/:id`
pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteServiceResponse>> {
    let deleted = state.db.services().delete(&id).await?;
    Ok(Json(DeleteServiceResponse { deleted }))
}
