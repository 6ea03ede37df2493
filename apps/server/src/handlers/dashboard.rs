//! # Dashboard & Report Handlers

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use medika_core::{DailySales, DashboardSummary};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReportQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// `GET /api/dashboard`
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardSummary>> {
    let summary = state.db.reports().dashboard().await?;
    Ok(Json(summary))
}

/// `GET /api/reports/sales?from=YYYY-MM-DD&to=YYYY-MM-DD`
pub async fn sales_report(
    State(state): State<AppState>,
    Query(query): Query<SalesReportQuery>,
) -> ApiResult<Json<Vec<DailySales>>> {
    if query.from > query.to {
        return Err(ApiError::validation("from must not be after to"));
    }

    let rows = state.db.reports().sales_by_day(query.from, query.to).await?;
    Ok(Json(rows))
}
