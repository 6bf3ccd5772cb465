use sqlx::PgPool;
use uuid::Uuid;

use crate::models::LedgerOutbox;

/// Queue an order whose ledger creation failed for reconciliation.
pub async fn enqueue(pool: &PgPool, order_id: Uuid, error: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ledger_outbox (order_id, last_error)
        VALUES ($1, $2)
        ON CONFLICT (order_id) DO NOTHING
        "#,
    )
    .bind(order_id)
    .bind(error)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn pending(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<LedgerOutbox>> {
    let rows = sqlx::query_as::<_, LedgerOutbox>(
        "SELECT * FROM ledger_outbox ORDER BY created_at ASC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn pending_count(pool: &PgPool) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ledger_outbox")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn record_failure(pool: &PgPool, id: i64, error: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE ledger_outbox
        SET attempts = attempts + 1, last_error = $2, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(error)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn remove(pool: &PgPool, id: i64) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM ledger_outbox WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
