use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Rider, RiderStatus};

/// Insert a new rider into the pool.
pub async fn insert_rider(
    pool: &PgPool,
    name: &str,
    phone: &str,
    status: RiderStatus,
    lat: Option<f64>,
    lng: Option<f64>,
    address: Option<&str>,
) -> anyhow::Result<Rider> {
    let rider = sqlx::query_as::<_, Rider>(
        r#"
        INSERT INTO riders (name, phone, status, lat, lng, address)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(phone)
    .bind(status)
    .bind(lat)
    .bind(lng)
    .bind(address)
    .fetch_one(pool)
    .await?;

    Ok(rider)
}

pub async fn get_rider(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Rider>> {
    let rider = sqlx::query_as::<_, Rider>("SELECT * FROM riders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(rider)
}

pub async fn list_riders(pool: &PgPool) -> anyhow::Result<Vec<Rider>> {
    let riders = sqlx::query_as::<_, Rider>("SELECT * FROM riders ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;

    Ok(riders)
}

/// Patch rider profile fields. Absent fields keep their current value.
pub async fn update_rider(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    phone: Option<&str>,
    status: Option<RiderStatus>,
    lat: Option<f64>,
    lng: Option<f64>,
    address: Option<&str>,
) -> anyhow::Result<Option<Rider>> {
    let rider = sqlx::query_as::<_, Rider>(
        r#"
        UPDATE riders
        SET name = COALESCE($2, name),
            phone = COALESCE($3, phone),
            status = COALESCE($4, status),
            lat = COALESCE($5, lat),
            lng = COALESCE($6, lng),
            address = COALESCE($7, address),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(phone)
    .bind(status)
    .bind(lat)
    .bind(lng)
    .bind(address)
    .fetch_optional(pool)
    .await?;

    Ok(rider)
}

/// Atomically claim a rider for dispatch. Returns `None` when the rider is
/// not currently available — two concurrent claims can never both succeed.
pub async fn claim_if_available(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Rider>> {
    let rider = sqlx::query_as::<_, Rider>(
        r#"
        UPDATE riders
        SET status = 'busy', updated_at = NOW()
        WHERE id = $1 AND status = 'available'
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(rider)
}

/// Return a rider to the pool after delivery or cancellation. Only flips
/// `busy` back to `available`; an admin-set `inactive` stays put.
pub async fn release_if_busy(pool: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "UPDATE riders SET status = 'available', updated_at = NOW() WHERE id = $1 AND status = 'busy'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
