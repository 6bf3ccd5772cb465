use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewOrder, Order, OrderItem, OrderStatus, ShippingStatus};

/// Insert an order together with its line-item snapshot in one database
/// transaction. The paired settlement ledger is created separately — its
/// failure must not roll back the order.
pub async fn insert_order(pool: &PgPool, new: &NewOrder) -> anyhow::Result<(Order, Vec<OrderItem>)> {
    let mut tx = pool.begin().await?;

    let order = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (
            user_id, seller_id, total, commission,
            shipping_method, shipping_fee,
            recipient_name, recipient_phone, recipient_address, recipient_city,
            distance_minutes_estimated
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(new.user_id)
    .bind(new.seller_id)
    .bind(new.total)
    .bind(new.commission)
    .bind(new.shipping_method)
    .bind(new.shipping_fee)
    .bind(&new.recipient_name)
    .bind(&new.recipient_phone)
    .bind(&new.recipient_address)
    .bind(&new.recipient_city)
    .bind(new.distance_minutes_estimated)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(new.items.len());
    for (position, item) in new.items.iter().enumerate() {
        let row = sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items (order_id, product_id, name, qty, unit_price, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(order.id)
        .bind(&item.product_id)
        .bind(&item.name)
        .bind(item.qty)
        .bind(item.unit_price)
        .bind(position as i32)
        .fetch_one(&mut *tx)
        .await?;
        items.push(row);
    }

    tx.commit().await?;

    Ok((order, items))
}

pub async fn get_order(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(order)
}

pub async fn get_items(pool: &PgPool, order_id: Uuid) -> anyhow::Result<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY position ASC",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

pub async fn list_for_seller(pool: &PgPool, seller_id: Uuid) -> anyhow::Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE seller_id = $1 ORDER BY created_at DESC",
    )
    .bind(seller_id)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

pub async fn list_all(pool: &PgPool) -> anyhow::Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;

    Ok(orders)
}

/// Does any live delivery still hold this rider? Used to block manual
/// rider-status edits that would free a rider mid-delivery.
pub async fn rider_has_live_order(pool: &PgPool, rider_id: Uuid) -> anyhow::Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM orders
            WHERE rider_id = $1
              AND cancelled_at IS NULL
              AND shipping_status NOT IN ('delivered', 'cancelled_with_fee', 'cancelled_no_fee')
        )
        "#,
    )
    .bind(rider_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Attach a claimed rider's snapshot to an order. Conditional: misses when
/// the order already has a rider or has reached a terminal state, so the
/// caller can release the claim.
pub async fn attach_rider(
    pool: &PgPool,
    order_id: Uuid,
    rider_id: Uuid,
    rider_name: &str,
    rider_phone: &str,
) -> anyhow::Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        UPDATE orders
        SET rider_id = $2,
            rider_name = $3,
            rider_phone = $4,
            shipping_status = 'rider_assigned',
            updated_at = NOW()
        WHERE id = $1
          AND rider_id IS NULL
          AND cancelled_at IS NULL
          AND status NOT IN ('successful', 'delivered', 'failed')
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(rider_id)
    .bind(rider_name)
    .bind(rider_phone)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

/// Apply a computed progress snapshot. Conditional: a concurrently
/// cancelled or already-delivered order rejects the write, which the engine
/// surfaces as a conflict (whichever the store commits first wins).
#[allow(clippy::too_many_arguments)]
pub async fn apply_progress(
    pool: &PgPool,
    order_id: Uuid,
    minutes_covered: f64,
    percent: f64,
    last_lat: Option<f64>,
    last_lng: Option<f64>,
    shipping_status: ShippingStatus,
    status: OrderStatus,
) -> anyhow::Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        UPDATE orders
        SET progress_minutes = $2,
            progress_percent = $3,
            last_lat = COALESCE($4, last_lat),
            last_lng = COALESCE($5, last_lng),
            last_seen_at = CASE WHEN $4 IS NOT NULL THEN NOW() ELSE last_seen_at END,
            shipping_status = $6,
            status = $7,
            updated_at = NOW()
        WHERE id = $1
          AND cancelled_at IS NULL
          AND shipping_status NOT IN ('delivered', 'cancelled_with_fee', 'cancelled_no_fee')
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(minutes_covered)
    .bind(percent)
    .bind(last_lat)
    .bind(last_lng)
    .bind(shipping_status)
    .bind(status)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

/// Write the cancellation block. The `cancelled_at IS NULL` guard makes the
/// block write-once: a second cancel, even concurrent with the first, misses
/// and never computes a second compensation payout.
pub async fn cancel_order(
    pool: &PgPool,
    order_id: Uuid,
    shipping_status: ShippingStatus,
    cancelled_by: &str,
    reason: &str,
    rider_compensation: i64,
) -> anyhow::Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        UPDATE orders
        SET status = 'failed',
            shipping_status = $2,
            cancelled_by = $3,
            cancelled_at = NOW(),
            cancel_reason = $4,
            rider_compensation_paid = $5,
            updated_at = NOW()
        WHERE id = $1
          AND cancelled_at IS NULL
          AND status NOT IN ('successful', 'delivered')
          AND shipping_status NOT IN ('delivered', 'cancelled_with_fee', 'cancelled_no_fee')
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(shipping_status)
    .bind(cancelled_by)
    .bind(reason)
    .bind(rider_compensation)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

/// Move the business status. Conditional on the current state being
/// non-terminal; a miss means the transition is no longer allowed.
pub async fn set_status(
    pool: &PgPool,
    order_id: Uuid,
    status: OrderStatus,
) -> anyhow::Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        UPDATE orders
        SET status = $2, updated_at = NOW()
        WHERE id = $1
          AND status NOT IN ('successful', 'delivered', 'failed')
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(status)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}
