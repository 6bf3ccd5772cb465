use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth::Identity;
use crate::db::order_repo;
use crate::engine::checkout::{checkout, CheckoutRequest};
use crate::engine::delivery::{self, ProgressUpdate};
use crate::engine::{dispatch, settlement};
use crate::errors::AppError;
use crate::models::{Order, OrderItem, OrderStatus, Role, Transaction};
use crate::AppState;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub transaction: Option<Transaction>,
    pub ledger_pending: bool,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct CancelRequest {
    pub reason: String,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub order: Order,
    pub rider_compensation: i64,
}

#[derive(Deserialize)]
pub struct AssignRiderRequest {
    pub rider_id: Uuid,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/orders — buyer checkout
pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CheckoutResponse>>), AppError> {
    identity.require_role(Role::Buyer)?;

    let outcome = checkout(&state.db, identity.user_id, body).await?;

    if let Some(notifier) = &state.notifier {
        notifier
            .order_created(&outcome.order, outcome.ledger_pending)
            .await;
    }

    let response = CheckoutResponse {
        order: outcome.order,
        items: outcome.items,
        transaction: outcome.transaction,
        ledger_pending: outcome.ledger_pending,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            success: true,
            data: Some(response),
            error: None,
        }),
    ))
}

/// GET /api/orders/{id} — role-scoped order detail
pub async fn detail(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderDetail>>, AppError> {
    let order = order_repo::get_order(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".into()))?;

    let allowed = match identity.role {
        Role::Admin => true,
        Role::Buyer => order.user_id == identity.user_id,
        Role::Seller => order.seller_id == Some(identity.user_id),
        Role::Rider => order.rider_id == Some(identity.user_id),
    };
    if !allowed {
        return Err(AppError::Forbidden("not your order".into()));
    }

    let items = order_repo::get_items(&state.db, id).await?;
    Ok(ApiResponse::ok(OrderDetail { order, items }))
}

/// GET /api/orders — buyer: own, seller: their shop's, admin: all
pub async fn list(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<ApiResponse<Vec<Order>>>, AppError> {
    let orders = match identity.role {
        Role::Buyer => order_repo::list_for_user(&state.db, identity.user_id).await?,
        Role::Seller => order_repo::list_for_seller(&state.db, identity.user_id).await?,
        Role::Admin => order_repo::list_all(&state.db).await?,
        Role::Rider => {
            return Err(AppError::Forbidden("riders cannot list orders".into()));
        }
    };

    Ok(ApiResponse::ok(orders))
}

/// POST /api/orders/{id}/cancel — buyer cancels, with mid-flight rider
/// compensation where due
pub async fn cancel(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<CancelRequest>,
) -> Result<Json<ApiResponse<CancelResponse>>, AppError> {
    identity.require_role(Role::Buyer)?;

    let (order, rider_compensation) =
        delivery::cancel(&state.db, id, identity.user_id, &body.reason).await?;

    if let Some(notifier) = &state.notifier {
        notifier.order_cancelled(&order, rider_compensation).await;
    }

    Ok(ApiResponse::ok(CancelResponse {
        order,
        rider_compensation,
    }))
}

/// POST /api/orders/{id}/assign-rider — admin dispatch
pub async fn assign_rider(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<AssignRiderRequest>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    identity.require_admin()?;

    let order = dispatch::assign_rider(&state.db, id, body.rider_id).await?;
    Ok(ApiResponse::ok(order))
}

/// POST /api/orders/{id}/rider-progress — rider/admin progress ingestion
pub async fn rider_progress(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<ProgressUpdate>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    if identity.role != Role::Rider && identity.role != Role::Admin {
        return Err(AppError::Forbidden("rider or admin access required".into()));
    }

    let order = delivery::report_progress(&state.db, id, body).await?;

    if order.status == OrderStatus::Delivered {
        if let Some(notifier) = &state.notifier {
            notifier.order_delivered(order.id).await;
        }
    }

    Ok(ApiResponse::ok(order))
}

/// POST /api/orders/{id}/status — owning seller moves the business status
pub async fn update_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    identity.require_role(Role::Seller)?;

    let order =
        settlement::seller_update_status(&state.db, id, identity.user_id, body.status).await?;
    Ok(ApiResponse::ok(order))
}
