use sqlx::PgPool;
use uuid::Uuid;

/// Record an admin override with actor identity and timestamp. Overrides
/// bypass the normal guards, so every one of them leaves a trail.
pub async fn record(
    pool: &PgPool,
    actor: Uuid,
    action: &str,
    subject_id: Uuid,
    note: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_log (actor, action, subject_id, note)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(actor)
    .bind(action)
    .bind(subject_id)
    .bind(note)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn count_for_subject(pool: &PgPool, subject_id: Uuid) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log WHERE subject_id = $1")
        .bind(subject_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
