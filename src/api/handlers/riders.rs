use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::Identity;
use crate::db::{order_repo, rider_repo};
use crate::errors::AppError;
use crate::models::{Rider, RiderStatus};
use crate::AppState;

use super::orders::ApiResponse;

#[derive(Deserialize)]
pub struct CreateRiderRequest {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub status: Option<RiderStatus>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct UpdateRiderRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub status: Option<RiderStatus>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: Option<String>,
}

/// GET /api/riders — admin pool view
pub async fn list(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<ApiResponse<Vec<Rider>>>, AppError> {
    identity.require_admin()?;

    let riders = rider_repo::list_riders(&state.db).await?;
    Ok(ApiResponse::ok(riders))
}

/// POST /api/riders — admin adds a rider
pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateRiderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Rider>>), AppError> {
    identity.require_admin()?;

    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }

    let rider = rider_repo::insert_rider(
        &state.db,
        &body.name,
        &body.phone,
        body.status.unwrap_or(RiderStatus::Available),
        body.lat,
        body.lng,
        body.address.as_deref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            success: true,
            data: Some(rider),
            error: None,
        }),
    ))
}

/// PUT /api/riders/{id} — admin edits a rider
pub async fn update(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRiderRequest>,
) -> Result<Json<ApiResponse<Rider>>, AppError> {
    identity.require_admin()?;

    // A manual status edit must not pull a rider out from under a delivery
    // in flight; otherwise a second order could claim them.
    if matches!(body.status, Some(s) if s != RiderStatus::Busy)
        && order_repo::rider_has_live_order(&state.db, id).await?
    {
        return Err(AppError::Conflict(
            "rider is still assigned to a live order".into(),
        ));
    }

    let rider = rider_repo::update_rider(
        &state.db,
        id,
        body.name.as_deref(),
        body.phone.as_deref(),
        body.status,
        body.lat,
        body.lng,
        body.address.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("rider not found".into()))?;

    Ok(ApiResponse::ok(rider))
}
