//! # Patient Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use medika_core::{validation, Patient};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPatientsQuery {
    pub search: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRequest {
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// `GET /api/patients`
pub async fn list_patients(
    State(state): State<AppState>,
    Query(query): Query<ListPatientsQuery>,
) -> ApiResult<Json<Vec<Patient>>> {
    let search = match &query.search {
        Some(raw) => Some(validation::validate_search_query(raw)?),
        None => None,
    };

    let patients = state
        .db
        .patients()
        .list(search.as_deref(), query.limit.unwrap_or(100))
        .await?;

    Ok(Json(patients))
}

/// `POST /api/patients`
pub async fn create_patient(
    State(state): State<AppState>,
    Json(request): Json<PatientRequest>,
) -> ApiResult<Json<Patient>> {
    validation::validate_name(&request.name)?;

    let now = Utc::now();
    let patient = Patient {
        id: Uuid::new_v4().to_string(),
        name: request.name.trim().to_string(),
        date_of_birth: request.date_of_birth,
        gender: request.gender,
        phone: request.phone,
        address: request.address,
        notes: request.notes,
        created_at: now,
        updated_at: now,
    };

    let patient = state.db.patients().insert(&patient).await?;
    Ok(Json(patient))
}

/// `GET /api/patients/:id`
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Patient>> {
    let patient = state
        .db
        .patients()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Patient", &id))?;

    Ok(Json(patient))
}

/// `PUT /api/patients/:id`
pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PatientRequest>,
) -> ApiResult<Json<Patient>> {
    validation::validate_name(&request.name)?;

    let mut patient = state
        .db
        .patients()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Patient", &id))?;

    patient.name = request.name.trim().to_string();
    patient.date_of_birth = request.date_of_birth;
    patient.gender = request.gender;
    patient.phone = request.phone;
    patient.address = request.address;
    patient.notes = request.notes;

    state.db.patients().update(&patient).await?;

    let patient = state
        .db
        .patients()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Patient", &id))?;

    Ok(Json(patient))
}

/// `DELETE /api/patients/:id`
pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.patients().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
