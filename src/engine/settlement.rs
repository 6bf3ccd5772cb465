use metrics::counter;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{audit_repo, order_repo, transaction_repo};
use crate::errors::AppError;
use crate::models::{Order, OrderStatus, Role, SettlementStatus, Transaction};

/// Record the buyer's proof of transfer on the ledger and move the linked
/// order to `transferred`. Payment is an externally-verified proof, not a
/// live gateway charge.
pub async fn submit_payment_proof(
    pool: &PgPool,
    transaction_id: Uuid,
    acting_user: Uuid,
    proof_url: &str,
) -> Result<Transaction, AppError> {
    if proof_url.trim().is_empty() {
        return Err(AppError::BadRequest("proof URL is required".into()));
    }

    let tx = transaction_repo::get_transaction(pool, transaction_id)
        .await?
        .ok_or_else(|| AppError::NotFound("transaction not found".into()))?;

    if tx.user_id != acting_user {
        return Err(AppError::Forbidden("not your transaction".into()));
    }

    let tx = transaction_repo::set_payment_proof(pool, transaction_id, proof_url)
        .await?
        .ok_or_else(|| AppError::Conflict("transaction is already settled".into()))?;

    // Best-effort: keep the order's business status in step. A miss here
    // (already terminal) is logged, never propagated.
    match order_repo::set_status(pool, tx.order_id, OrderStatus::Transferred).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            tracing::warn!(
                order_id = %tx.order_id,
                "Payment proof recorded but order no longer accepts status updates"
            );
        }
        Err(e) => {
            tracing::error!(
                order_id = %tx.order_id,
                error = %e,
                "Failed to move order to transferred after payment proof"
            );
        }
    }

    tracing::info!(transaction_id = %tx.id, "Payment proof recorded");
    Ok(tx)
}

/// One party (buyer or seller) confirms the settlement. Idempotent — a
/// repeat confirmation by the same role has no additional effect. Once both
/// parties have confirmed and the ledger is in a confirmable state, it
/// advances to `successful`; that and the admin override are the only two
/// paths there.
pub async fn confirm(
    pool: &PgPool,
    transaction_id: Uuid,
    acting_user: Uuid,
    role: Role,
) -> Result<Transaction, AppError> {
    let tx = transaction_repo::get_transaction(pool, transaction_id)
        .await?
        .ok_or_else(|| AppError::NotFound("transaction not found".into()))?;

    let (as_user, as_seller) = match role {
        Role::Buyer => {
            if tx.user_id != acting_user {
                return Err(AppError::Forbidden("not your transaction".into()));
            }
            (true, false)
        }
        Role::Seller => {
            if tx.seller_id != Some(acting_user) {
                return Err(AppError::Forbidden("not your transaction".into()));
            }
            (false, true)
        }
        _ => {
            return Err(AppError::Forbidden(
                "only the buyer or the seller can confirm".into(),
            ));
        }
    };

    let tx = transaction_repo::set_confirmation(pool, transaction_id, as_user, as_seller)
        .await?
        .ok_or_else(|| AppError::NotFound("transaction not found".into()))?;

    if tx.user_confirmed && tx.seller_confirmed && tx.status.confirmable() {
        if let Some(promoted) = transaction_repo::promote_if_confirmed(pool, transaction_id).await? {
            tracing::info!(transaction_id = %promoted.id, "Settlement successful (dual confirmation)");
            return Ok(promoted);
        }
    }

    Ok(tx)
}

/// Seller-driven order status update, fanned out to the ledger best-effort.
pub async fn seller_update_status(
    pool: &PgPool,
    order_id: Uuid,
    acting_seller: Uuid,
    new_status: OrderStatus,
) -> Result<Order, AppError> {
    let order = order_repo::get_order(pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".into()))?;

    if order.seller_id != Some(acting_seller) {
        return Err(AppError::Forbidden("not your order".into()));
    }
    if order.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "order is {:?} and accepts no further transitions",
            order.status
        )));
    }
    // Failure is only reachable through cancellation, which also settles the
    // shipping axis and the rider payout. A bare status write would leave
    // those behind.
    if new_status == OrderStatus::Failed {
        return Err(AppError::BadRequest(
            "orders fail through cancellation, not a status update".into(),
        ));
    }

    let order = order_repo::set_status(pool, order_id, new_status)
        .await?
        .ok_or_else(|| AppError::Conflict("order reached a terminal state".into()))?;

    // Fan the same value out to the ledger. Not transactional by design:
    // a failure is logged for reconciliation, the order update stands.
    match transaction_repo::get_by_order(pool, order_id).await {
        Ok(Some(tx)) => {
            if let Err(e) =
                transaction_repo::set_status(pool, tx.id, SettlementStatus::from(new_status)).await
            {
                tracing::error!(
                    order_id = %order_id,
                    transaction_id = %tx.id,
                    error = %e,
                    "Status fan-out to ledger failed"
                );
            }
        }
        Ok(None) => {
            tracing::warn!(order_id = %order_id, "No ledger found for status fan-out");
        }
        Err(e) => {
            tracing::error!(order_id = %order_id, error = %e, "Ledger lookup failed during fan-out");
        }
    }

    Ok(order)
}

/// Admin override: unconditional approval. Documented escape hatch for
/// disputes; always audit-logged.
pub async fn admin_approve(
    pool: &PgPool,
    transaction_id: Uuid,
    actor: Uuid,
    note: Option<&str>,
) -> Result<Transaction, AppError> {
    let tx = transaction_repo::admin_approve(pool, transaction_id, note)
        .await?
        .ok_or_else(|| AppError::NotFound("transaction not found".into()))?;

    counter!("admin_overrides_total").increment(1);
    audit_repo::record(pool, actor, "admin_approve", transaction_id, note).await?;
    tracing::info!(transaction_id = %tx.id, actor = %actor, "Admin approved settlement");

    Ok(tx)
}

/// Admin override: unconditional success, bypassing dual confirmation.
/// Exists to resolve stuck orders; always audit-logged.
pub async fn admin_mark_successful(
    pool: &PgPool,
    transaction_id: Uuid,
    actor: Uuid,
) -> Result<Transaction, AppError> {
    let tx = transaction_repo::admin_mark_successful(pool, transaction_id)
        .await?
        .ok_or_else(|| AppError::NotFound("transaction not found".into()))?;

    counter!("admin_overrides_total").increment(1);
    audit_repo::record(pool, actor, "admin_mark_successful", transaction_id, None).await?;

    // Best-effort nudge of the linked order.
    match order_repo::set_status(pool, tx.order_id, OrderStatus::Transferred).await {
        Ok(_) => {}
        Err(e) => {
            tracing::error!(
                order_id = %tx.order_id,
                error = %e,
                "Failed to update order after admin success override"
            );
        }
    }

    tracing::info!(transaction_id = %tx.id, actor = %actor, "Admin forced settlement successful");
    Ok(tx)
}
