//! # Settings Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use medika_core::Setting;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingRequest {
    pub value: String,
}

/// `GET /api/settings`
pub async fn list_settings(State(state): State<AppState>) -> ApiResult<Json<Vec<Setting>>> {
    let settings = state.db.settings().get_all().await?;
    Ok(Json(settings))
}

/// `PUT /api/settings/:key`
pub async fn update_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<SettingRequest>,
) -> ApiResult<Json<Setting>> {
    if key.trim().is_empty() {
        return Err(ApiError::validation("setting key is required"));
    }

    let setting = state.db.settings().set(&key, &request.value).await?;
    Ok(Json(setting))
}
