use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewTransaction, SettlementStatus, Transaction};

/// Insert the settlement ledger row paired to an order.
pub async fn insert_transaction(
    pool: &PgPool,
    new: &NewTransaction,
) -> anyhow::Result<Transaction> {
    let tx = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            order_id, user_id, seller_id,
            total_amount, service_charge_percent, service_charge_amount, amount_to_seller
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(new.order_id)
    .bind(new.user_id)
    .bind(new.seller_id)
    .bind(new.total_amount)
    .bind(new.service_charge_percent)
    .bind(new.service_charge_amount)
    .bind(new.amount_to_seller)
    .fetch_one(pool)
    .await?;

    Ok(tx)
}

pub async fn get_transaction(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Transaction>> {
    let tx = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(tx)
}

pub async fn get_by_order(pool: &PgPool, order_id: Uuid) -> anyhow::Result<Option<Transaction>> {
    let tx = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(pool)
        .await?;

    Ok(tx)
}

pub async fn list_all(pool: &PgPool) -> anyhow::Result<Vec<Transaction>> {
    let txs =
        sqlx::query_as::<_, Transaction>("SELECT * FROM transactions ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?;

    Ok(txs)
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Transaction>> {
    let txs = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(txs)
}

pub async fn list_for_seller(pool: &PgPool, seller_id: Uuid) -> anyhow::Result<Vec<Transaction>> {
    let txs = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE seller_id = $1 ORDER BY created_at DESC",
    )
    .bind(seller_id)
    .fetch_all(pool)
    .await?;

    Ok(txs)
}

/// Record the buyer's payment proof and move the ledger to
/// `payment_confirmed`. Conditional on the ledger not being terminal.
pub async fn set_payment_proof(
    pool: &PgPool,
    id: Uuid,
    proof_url: &str,
) -> anyhow::Result<Option<Transaction>> {
    let tx = sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET payment_proof = $2,
            status = 'payment_confirmed',
            user_confirmed = TRUE,
            updated_at = NOW()
        WHERE id = $1
          AND status NOT IN ('successful', 'failed')
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(proof_url)
    .fetch_optional(pool)
    .await?;

    Ok(tx)
}

/// Set one party's confirmation flag. Idempotent: flags only ever go from
/// false to true.
pub async fn set_confirmation(
    pool: &PgPool,
    id: Uuid,
    user_confirmed: bool,
    seller_confirmed: bool,
) -> anyhow::Result<Option<Transaction>> {
    let tx = sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET user_confirmed = user_confirmed OR $2,
            seller_confirmed = seller_confirmed OR $3,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_confirmed)
    .bind(seller_confirmed)
    .fetch_optional(pool)
    .await?;

    Ok(tx)
}

/// Promote a dually-confirmed ledger to `successful`. Conditional on both
/// flags and a confirmable current status; the only other path to
/// `successful` is the admin override.
pub async fn promote_if_confirmed(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Transaction>> {
    let tx = sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET status = 'successful', updated_at = NOW()
        WHERE id = $1
          AND user_confirmed AND seller_confirmed
          AND status IN ('approved', 'payment_confirmed')
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(tx)
}

/// Mirror an order-status change onto the ledger (best-effort fan-out).
pub async fn set_status(
    pool: &PgPool,
    id: Uuid,
    status: SettlementStatus,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE transactions SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;

    Ok(())
}

/// Admin override: unconditional approval, keeping the dispute note.
pub async fn admin_approve(
    pool: &PgPool,
    id: Uuid,
    note: Option<&str>,
) -> anyhow::Result<Option<Transaction>> {
    let tx = sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET status = 'approved',
            admin_note = COALESCE($2, admin_note),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(note)
    .fetch_optional(pool)
    .await?;

    Ok(tx)
}

/// Admin override: unconditional success, forcing both confirmation flags.
pub async fn admin_mark_successful(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Transaction>> {
    let tx = sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET status = 'successful',
            user_confirmed = TRUE,
            seller_confirmed = TRUE,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(tx)
}
