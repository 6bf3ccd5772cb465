use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::Identity;
use crate::db::transaction_repo;
use crate::engine::settlement;
use crate::errors::AppError;
use crate::models::{Role, SettlementStatus, Transaction};
use crate::AppState;

use super::orders::ApiResponse;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ProofRequest {
    pub proof_url: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct AdminApproveRequest {
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/transactions/all — admin ledger view
pub async fn list_all(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, AppError> {
    identity.require_admin()?;

    let txs = transaction_repo::list_all(&state.db).await?;
    Ok(ApiResponse::ok(txs))
}

/// GET /api/transactions/user/me — buyer's own ledger entries
pub async fn user_me(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, AppError> {
    identity.require_role(Role::Buyer)?;

    let txs = transaction_repo::list_for_user(&state.db, identity.user_id).await?;
    Ok(ApiResponse::ok(txs))
}

/// GET /api/transactions/seller/me — seller's own ledger entries
pub async fn seller_me(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, AppError> {
    identity.require_role(Role::Seller)?;

    let txs = transaction_repo::list_for_seller(&state.db, identity.user_id).await?;
    Ok(ApiResponse::ok(txs))
}

/// POST /api/transactions/{id}/proof — buyer submits proof of transfer
pub async fn submit_proof(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<ProofRequest>,
) -> Result<Json<ApiResponse<Transaction>>, AppError> {
    identity.require_role(Role::Buyer)?;

    let tx =
        settlement::submit_payment_proof(&state.db, id, identity.user_id, &body.proof_url).await?;
    Ok(ApiResponse::ok(tx))
}

/// POST /api/transactions/{id}/confirm — buyer or seller confirmation
pub async fn confirm(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Transaction>>, AppError> {
    let tx = settlement::confirm(&state.db, id, identity.user_id, identity.role).await?;

    if tx.status == SettlementStatus::Successful {
        if let Some(notifier) = &state.notifier {
            notifier.settlement_successful(tx.id).await;
        }
    }

    Ok(ApiResponse::ok(tx))
}

/// POST /api/transactions/{id}/admin-approve — unconditional admin override
pub async fn admin_approve(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<AdminApproveRequest>,
) -> Result<Json<ApiResponse<Transaction>>, AppError> {
    identity.require_admin()?;

    let tx =
        settlement::admin_approve(&state.db, id, identity.user_id, body.note.as_deref()).await?;
    Ok(ApiResponse::ok(tx))
}

/// POST /api/transactions/{id}/admin-success — unconditional admin override
pub async fn admin_success(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Transaction>>, AppError> {
    identity.require_admin()?;

    let tx = settlement::admin_mark_successful(&state.db, id, identity.user_id).await?;
    Ok(ApiResponse::ok(tx))
}
