use sqlx::PgPool;

use crate::models::Settings;

/// Fetch the platform settings row, creating it with zero fees on first use.
pub async fn get_or_create(pool: &PgPool) -> anyhow::Result<Settings> {
    let settings = sqlx::query_as::<_, Settings>(
        r#"
        INSERT INTO settings (id)
        VALUES (1)
        ON CONFLICT (id) DO UPDATE SET id = excluded.id
        RETURNING *
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(settings)
}

/// Update fallback fees. Absent fields keep their current value.
pub async fn update_fees(
    pool: &PgPool,
    pickup_fee: Option<i64>,
    delivery_fee: Option<i64>,
) -> anyhow::Result<Settings> {
    let settings = sqlx::query_as::<_, Settings>(
        r#"
        UPDATE settings
        SET pickup_fee = COALESCE($1, pickup_fee),
            delivery_fee = COALESCE($2, delivery_fee),
            updated_at = NOW()
        WHERE id = 1
        RETURNING *
        "#,
    )
    .bind(pickup_fee)
    .bind(delivery_fee)
    .fetch_one(pool)
    .await?;

    Ok(settings)
}
