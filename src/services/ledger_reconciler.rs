use metrics::{counter, gauge};
use sqlx::PgPool;
use tokio::time::{interval, Duration};

use crate::db::{order_repo, outbox_repo, transaction_repo};
use crate::models::NewTransaction;
use crate::pricing;

const BATCH_SIZE: i64 = 50;

/// Run the ledger reconciler loop. Orders whose settlement ledger failed to
/// create at checkout sit in the outbox; each tick retries them until the
/// paired transaction row exists.
pub async fn run_ledger_reconciler(pool: PgPool, poll_interval_secs: u64) {
    let mut ticker = interval(Duration::from_secs(poll_interval_secs));
    tracing::info!(
        interval_secs = poll_interval_secs,
        "Ledger reconciler started"
    );

    loop {
        ticker.tick().await;

        if let Err(e) = reconcile_pending(&pool).await {
            tracing::error!(error = %e, "Reconciler: pass failed");
        }
    }
}

/// One reconciliation pass over the outbox. Returns the number of ledgers
/// successfully recreated.
pub async fn reconcile_pending(pool: &PgPool) -> anyhow::Result<usize> {
    let tasks = outbox_repo::pending(pool, BATCH_SIZE).await?;

    if let Ok(count) = outbox_repo::pending_count(pool).await {
        gauge!("ledger_outbox_pending").set(count as f64);
    }

    if tasks.is_empty() {
        return Ok(0);
    }

    tracing::info!(count = tasks.len(), "Reconciler: retrying pending ledgers");

    let mut reconciled = 0;
    for task in &tasks {
        if let Err(e) = reconcile_one(pool, task.order_id).await {
            tracing::error!(
                order_id = %task.order_id,
                attempts = task.attempts + 1,
                error = %e,
                "Reconciler: ledger creation still failing"
            );
            if let Err(store_err) = outbox_repo::record_failure(pool, task.id, &e.to_string()).await
            {
                tracing::error!(
                    order_id = %task.order_id,
                    error = %store_err,
                    "Reconciler: failed to record the attempt"
                );
            }
            continue;
        }

        if let Err(e) = outbox_repo::remove(pool, task.id).await {
            tracing::error!(
                order_id = %task.order_id,
                error = %e,
                "Reconciler: failed to clear completed task"
            );
        } else {
            counter!("ledger_reconciled_total").increment(1);
            reconciled += 1;
        }
    }

    Ok(reconciled)
}

/// Rebuild the settlement ledger from the persisted order. A no-op when the
/// ledger already exists (a concurrent retry or manual fix got there first).
async fn reconcile_one(pool: &PgPool, order_id: uuid::Uuid) -> anyhow::Result<()> {
    if transaction_repo::get_by_order(pool, order_id).await?.is_some() {
        tracing::info!(order_id = %order_id, "Reconciler: ledger already present");
        return Ok(());
    }

    let order = order_repo::get_order(pool, order_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("order {order_id} no longer exists"))?;

    let split = pricing::split(order.total, pricing::SERVICE_CHARGE_PERCENT);
    let new_tx = NewTransaction {
        order_id: order.id,
        user_id: order.user_id,
        seller_id: order.seller_id,
        total_amount: order.total,
        service_charge_percent: pricing::SERVICE_CHARGE_PERCENT,
        service_charge_amount: split.service_charge_amount,
        amount_to_seller: split.amount_to_seller,
    };

    let tx = transaction_repo::insert_transaction(pool, &new_tx).await?;
    tracing::info!(
        order_id = %order_id,
        transaction_id = %tx.id,
        "Reconciler: ledger recreated"
    );

    Ok(())
}
