use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::auth::Identity;
use crate::errors::AppError;
use crate::pricing;
use crate::AppState;

use super::orders::ApiResponse;

#[derive(Deserialize)]
pub struct CalcRequest {
    pub seller_lat: Option<f64>,
    pub seller_lng: Option<f64>,
    pub user_lat: Option<f64>,
    pub user_lng: Option<f64>,
}

#[derive(Serialize)]
pub struct CalcResponse {
    pub distance_km: f64,
    pub estimated_minutes: i64,
    pub fare: i64,
}

/// POST /api/shipping/calc — standalone delivery quote
pub async fn calc(
    State(_state): State<AppState>,
    _identity: Identity,
    Json(body): Json<CalcRequest>,
) -> Result<Json<ApiResponse<CalcResponse>>, AppError> {
    let (seller_lat, seller_lng, user_lat, user_lng) = match (
        body.seller_lat,
        body.seller_lng,
        body.user_lat,
        body.user_lng,
    ) {
        (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
        _ => {
            return Err(AppError::BadRequest(
                "seller_lat, seller_lng, user_lat and user_lng are required".into(),
            ));
        }
    };

    let quote = pricing::quote(
        pricing::Coordinates { lat: seller_lat, lng: seller_lng },
        pricing::Coordinates { lat: user_lat, lng: user_lng },
    )
    .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(ApiResponse::ok(CalcResponse {
        distance_km: (quote.distance_km * 1000.0).round() / 1000.0,
        estimated_minutes: quote.estimated_minutes,
        fare: quote.fare,
    }))
}
