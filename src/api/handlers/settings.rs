use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::auth::Identity;
use crate::db::settings_repo;
use crate::errors::AppError;
use crate::models::Settings;
use crate::AppState;

use super::orders::ApiResponse;

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct UpdateSettingsRequest {
    pub pickup_fee: Option<i64>,
    pub delivery_fee: Option<i64>,
}

/// GET /api/settings — current fallback fees (row is lazily created)
pub async fn get(
    State(state): State<AppState>,
    _identity: Identity,
) -> Result<Json<ApiResponse<Settings>>, AppError> {
    let settings = settings_repo::get_or_create(&state.db).await?;
    Ok(ApiResponse::ok(settings))
}

/// PUT /api/settings — admin updates fallback fees
pub async fn update(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<ApiResponse<Settings>>, AppError> {
    identity.require_admin()?;

    if body.pickup_fee.map_or(false, |f| f < 0) || body.delivery_fee.map_or(false, |f| f < 0) {
        return Err(AppError::BadRequest("fees must not be negative".into()));
    }

    settings_repo::get_or_create(&state.db).await?;
    let settings =
        settings_repo::update_fees(&state.db, body.pickup_fee, body.delivery_fee).await?;
    Ok(ApiResponse::ok(settings))
}
