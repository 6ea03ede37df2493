//! # Visit Handlers
//!
//! Standalone visit recording (a consultation without billing) and visit
//! history. Sale-linked visits are created by the transaction engine itself.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;
use medika_core::{NewVisitRecord, VisitRecord};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVisitsQuery {
    pub patient_id: Option<String>,
}

/// `POST /api/visits`
pub async fn create_visit(
    State(state): State<AppState>,
    Json(input): Json<NewVisitRecord>,
) -> ApiResult<Json<VisitRecord>> {
    let visit = state.db.visits().record(&input).await?;
    Ok(Json(visit))
}

/// `GET /api/visits?patientId=`
pub async fn list_visits(
    State(state): State<AppState>,
    Query(query): Query<ListVisitsQuery>,
) -> ApiResult<Json<Vec<VisitRecord>>> {
    let visits = state.db.visits().list(query.patient_id.as_deref()).await?;
    Ok(Json(visits))
}
