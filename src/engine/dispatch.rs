use metrics::counter;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{order_repo, rider_repo};
use crate::errors::AppError;
use crate::models::Order;

/// Assign an available rider to a transferred order.
///
/// The rider claim is a storage-level compare-and-swap on the status field:
/// of two concurrent assignments for the same rider, exactly one wins. The
/// loser gets a conflict and must pick another rider.
pub async fn assign_rider(pool: &PgPool, order_id: Uuid, rider_id: Uuid) -> Result<Order, AppError> {
    let order = order_repo::get_order(pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".into()))?;

    if order.is_cancelled() || order.status.is_terminal() || order.shipping_status.is_terminal() {
        return Err(AppError::Conflict(
            "order can no longer be dispatched".into(),
        ));
    }
    if order.rider_id.is_some() {
        return Err(AppError::Conflict("order already has a rider".into()));
    }

    // Distinguish "unknown rider" from "rider exists but is not available".
    let rider_exists = rider_repo::get_rider(pool, rider_id).await?.is_some();
    if !rider_exists {
        return Err(AppError::NotFound("rider not found".into()));
    }

    let rider = match rider_repo::claim_if_available(pool, rider_id).await? {
        Some(rider) => rider,
        None => {
            counter!("rider_assign_conflicts_total").increment(1);
            return Err(AppError::Conflict("rider already busy".into()));
        }
    };

    match order_repo::attach_rider(pool, order_id, rider.id, &rider.name, &rider.phone).await? {
        Some(order) => {
            tracing::info!(
                order_id = %order.id,
                rider_id = %rider.id,
                "Rider assigned"
            );
            Ok(order)
        }
        None => {
            // The order changed underneath us (cancelled or raced another
            // assignment) — give the claim back.
            rider_repo::release_if_busy(pool, rider.id).await?;
            Err(AppError::Conflict(
                "order can no longer be dispatched".into(),
            ))
        }
    }
}
