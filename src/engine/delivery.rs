use metrics::counter;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{order_repo, rider_repo};
use crate::errors::AppError;
use crate::models::{Order, OrderStatus, ShippingStatus};
use crate::pricing;

// ---------------------------------------------------------------------------
// Progress ingestion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LastLocation {
    pub lat: f64,
    pub lng: f64,
}

/// Rider-side progress report. All fields optional; absent fields keep
/// their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProgressUpdate {
    pub minutes_covered: Option<f64>,
    pub percent: Option<f64>,
    pub last_location: Option<LastLocation>,
    pub shipping_status: Option<ShippingStatus>,
}

/// Apply a rider progress report to an order.
///
/// Progress is monotonically non-decreasing while the order is live. An
/// explicit shipping status is accepted only for rider-reportable values;
/// otherwise the first sign of motion auto-advances the order to `en_route`.
/// Hitting 100 percent (or an explicit `delivered`) completes the delivery
/// and returns the rider to the pool.
pub async fn report_progress(
    pool: &PgPool,
    order_id: Uuid,
    update: ProgressUpdate,
) -> Result<Order, AppError> {
    let order = order_repo::get_order(pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".into()))?;

    if order.is_cancelled() || order.shipping_status.is_terminal() {
        return Err(AppError::Conflict(
            "order is already cancelled or delivered".into(),
        ));
    }

    let minutes_covered = update
        .minutes_covered
        .map(|m| m.max(order.progress_minutes))
        .unwrap_or(order.progress_minutes);
    let percent = update
        .percent
        .map(|p| p.clamp(0.0, 100.0).max(order.progress_percent))
        .unwrap_or(order.progress_percent);

    let mut shipping_status = match update.shipping_status {
        Some(reported) if reported.reportable_by_rider() => reported,
        Some(reported) => {
            return Err(AppError::BadRequest(format!(
                "shipping status {:?} cannot be reported by a rider",
                reported
            )));
        }
        None => {
            // Progress implies motion has started; don't require a separate
            // explicit transition out of the assignment states.
            if percent > 0.0
                && matches!(
                    order.shipping_status,
                    ShippingStatus::NotAssigned | ShippingStatus::RiderAssigned
                )
            {
                ShippingStatus::EnRoute
            } else {
                order.shipping_status
            }
        }
    };

    let delivered = percent >= 100.0 || shipping_status == ShippingStatus::Delivered;
    let status = if delivered {
        shipping_status = ShippingStatus::Delivered;
        OrderStatus::Delivered
    } else if shipping_status.rider_engaged() && !order.status.is_terminal() {
        OrderStatus::OutForDelivery
    } else {
        order.status
    };

    let (last_lat, last_lng) = match update.last_location {
        Some(loc) => (Some(loc.lat), Some(loc.lng)),
        None => (None, None),
    };

    let updated = order_repo::apply_progress(
        pool,
        order_id,
        minutes_covered,
        percent,
        last_lat,
        last_lng,
        shipping_status,
        status,
    )
    .await?
    // Lost the race to a concurrent cancellation; the store's commit wins.
    .ok_or_else(|| AppError::Conflict("order is already cancelled or delivered".into()))?;

    if delivered {
        counter!("orders_delivered_total").increment(1);
        tracing::info!(order_id = %updated.id, "Order delivered");

        if let Some(rider_id) = updated.rider_id {
            if let Err(e) = rider_repo::release_if_busy(pool, rider_id).await {
                tracing::error!(
                    order_id = %updated.id,
                    rider_id = %rider_id,
                    error = %e,
                    "Failed to release rider after delivery"
                );
            }
        }
    }

    Ok(updated)
}

// ---------------------------------------------------------------------------
// Cancellation & compensation
// ---------------------------------------------------------------------------

/// Cancel an order on the buyer's behalf.
///
/// A rider who has already physically engaged (picked up, en route, or
/// arrived) is compensated for half the value of the distance covered so
/// far. The cancellation block is write-once: a second cancel attempt fails
/// with a conflict and never computes a second payout.
pub async fn cancel(
    pool: &PgPool,
    order_id: Uuid,
    acting_user: Uuid,
    reason: &str,
) -> Result<(Order, i64), AppError> {
    let order = order_repo::get_order(pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".into()))?;

    if order.user_id != acting_user {
        return Err(AppError::Forbidden("not your order".into()));
    }
    if order.is_cancelled() {
        return Err(AppError::Conflict("order already cancelled".into()));
    }
    if matches!(
        order.status,
        OrderStatus::Delivered | OrderStatus::Successful
    ) || order.shipping_status == ShippingStatus::Delivered
    {
        return Err(AppError::Conflict(
            "cannot cancel a delivered or completed order".into(),
        ));
    }

    let (rider_compensation, shipping_status) = if order.shipping_status.rider_engaged() {
        (
            pricing::rider_compensation(order.progress_minutes),
            ShippingStatus::CancelledWithFee,
        )
    } else {
        (0, ShippingStatus::CancelledNoFee)
    };

    let cancelled = order_repo::cancel_order(
        pool,
        order_id,
        shipping_status,
        "user",
        reason,
        rider_compensation,
    )
    .await?
    // Conditional write missed: a concurrent cancel or delivery got there
    // first.
    .ok_or_else(|| AppError::Conflict("order already cancelled".into()))?;

    counter!("orders_cancelled_total").increment(1);
    tracing::info!(
        order_id = %cancelled.id,
        rider_compensation,
        shipping_status = ?cancelled.shipping_status,
        "Order cancelled"
    );

    if let Some(rider_id) = cancelled.rider_id {
        if let Err(e) = rider_repo::release_if_busy(pool, rider_id).await {
            tracing::error!(
                order_id = %cancelled.id,
                rider_id = %rider_id,
                error = %e,
                "Failed to release rider after cancellation"
            );
        }
    }

    Ok((cancelled, rider_compensation))
}
