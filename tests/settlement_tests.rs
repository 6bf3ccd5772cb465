mod common;

use uuid::Uuid;

use okadamart::db::{audit_repo, order_repo, outbox_repo, transaction_repo};
use okadamart::engine::settlement;
use okadamart::errors::AppError;
use okadamart::models::{OrderStatus, Role, SettlementStatus};
use okadamart::services::ledger_reconciler;

#[tokio::test]
async fn test_checkout_creates_ledger_with_exact_split() {
    // Total 10_500 -> service charge 1_050, seller 9_450.
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let outcome =
        common::place_pickup_order(&pool, Uuid::new_v4(), Uuid::new_v4(), 10_000).await;

    assert_eq!(outcome.order.total, 10_500);
    assert!(!outcome.ledger_pending);

    let tx = outcome.transaction.expect("ledger row expected");
    assert_eq!(tx.total_amount, 10_500);
    assert_eq!(tx.service_charge_percent, 10);
    assert_eq!(tx.service_charge_amount, 1_050);
    assert_eq!(tx.amount_to_seller, 9_450);
    assert_eq!(tx.service_charge_amount + tx.amount_to_seller, tx.total_amount);
    assert_eq!(tx.status, SettlementStatus::Pending);
}

#[tokio::test]
async fn test_payment_proof_moves_ledger_and_order() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let buyer = Uuid::new_v4();
    let outcome = common::place_pickup_order(&pool, buyer, Uuid::new_v4(), 3_000).await;
    let tx = outcome.transaction.unwrap();

    let tx = settlement::submit_payment_proof(&pool, tx.id, buyer, "https://proof.example/1.png")
        .await
        .unwrap();

    assert_eq!(tx.status, SettlementStatus::PaymentConfirmed);
    assert!(tx.user_confirmed);
    assert_eq!(tx.payment_proof.as_deref(), Some("https://proof.example/1.png"));

    let order = order_repo::get_order(&pool, outcome.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Transferred);
}

#[tokio::test]
async fn test_payment_proof_rejects_strangers_and_blank_urls() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let buyer = Uuid::new_v4();
    let outcome = common::place_pickup_order(&pool, buyer, Uuid::new_v4(), 3_000).await;
    let tx = outcome.transaction.unwrap();

    let err = settlement::submit_payment_proof(&pool, tx.id, buyer, "   ")
        .await
        .expect_err("blank proof must fail");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = settlement::submit_payment_proof(&pool, tx.id, Uuid::new_v4(), "https://x/y.png")
        .await
        .expect_err("stranger proof must fail");
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_dual_confirmation_promotes_to_successful() {
    // Approved ledger, buyer confirms, then seller confirms -> successful.
    // A third confirmation changes nothing.
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();
    let outcome = common::place_pickup_order(&pool, buyer, seller, 8_000).await;
    let tx = outcome.transaction.unwrap();

    settlement::admin_approve(&pool, tx.id, Uuid::new_v4(), Some("manual check ok"))
        .await
        .unwrap();

    let tx = settlement::confirm(&pool, tx.id, buyer, Role::Buyer).await.unwrap();
    assert!(tx.user_confirmed);
    assert!(!tx.seller_confirmed);
    assert_eq!(tx.status, SettlementStatus::Approved);

    let tx = settlement::confirm(&pool, tx.id, seller, Role::Seller).await.unwrap();
    assert!(tx.seller_confirmed);
    assert_eq!(tx.status, SettlementStatus::Successful);

    // Idempotent repeat.
    let tx = settlement::confirm(&pool, tx.id, buyer, Role::Buyer).await.unwrap();
    assert_eq!(tx.status, SettlementStatus::Successful);
}

#[tokio::test]
async fn test_confirmation_before_approval_does_not_promote() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();
    let outcome = common::place_pickup_order(&pool, buyer, seller, 8_000).await;
    let tx = outcome.transaction.unwrap();

    settlement::confirm(&pool, tx.id, buyer, Role::Buyer).await.unwrap();
    let tx = settlement::confirm(&pool, tx.id, seller, Role::Seller).await.unwrap();

    // Both flags set, but the ledger is still pending, so no promotion.
    assert!(tx.user_confirmed && tx.seller_confirmed);
    assert_eq!(tx.status, SettlementStatus::Pending);
}

#[tokio::test]
async fn test_confirmation_requires_matching_party() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();
    let outcome = common::place_pickup_order(&pool, buyer, seller, 1_000).await;
    let tx = outcome.transaction.unwrap();

    let err = settlement::confirm(&pool, tx.id, Uuid::new_v4(), Role::Buyer)
        .await
        .expect_err("wrong buyer must fail");
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = settlement::confirm(&pool, tx.id, buyer, Role::Rider)
        .await
        .expect_err("rider cannot confirm");
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_seller_status_update_fans_out_to_ledger() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let seller = Uuid::new_v4();
    let outcome = common::place_pickup_order(&pool, Uuid::new_v4(), seller, 4_000).await;

    let order =
        settlement::seller_update_status(&pool, outcome.order.id, seller, OrderStatus::Processing)
            .await
            .unwrap();
    assert_eq!(order.status, OrderStatus::Processing);

    let tx = transaction_repo::get_by_order(&pool, outcome.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, SettlementStatus::Processing);

    // Not the seller's order.
    let err =
        settlement::seller_update_status(&pool, outcome.order.id, Uuid::new_v4(), OrderStatus::Approved)
            .await
            .expect_err("stranger update must fail");
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_seller_cannot_fail_an_order_directly() {
    // Failure is reserved for cancellation, which also writes the shipping
    // axis and the compensation block.
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let seller = Uuid::new_v4();
    let outcome = common::place_pickup_order(&pool, Uuid::new_v4(), seller, 4_000).await;

    let err =
        settlement::seller_update_status(&pool, outcome.order.id, seller, OrderStatus::Failed)
            .await
            .expect_err("direct failure must be rejected");
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    let order = order_repo::get_order(&pool, outcome.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.cancelled_at.is_none());
}

#[tokio::test]
async fn test_admin_overrides_are_audited() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let outcome = common::place_pickup_order(&pool, Uuid::new_v4(), Uuid::new_v4(), 2_000).await;
    let tx = outcome.transaction.unwrap();
    let admin = Uuid::new_v4();

    let tx2 = settlement::admin_approve(&pool, tx.id, admin, Some("dispute resolved"))
        .await
        .unwrap();
    assert_eq!(tx2.status, SettlementStatus::Approved);
    assert_eq!(tx2.admin_note.as_deref(), Some("dispute resolved"));

    let tx3 = settlement::admin_mark_successful(&pool, tx.id, admin).await.unwrap();
    assert_eq!(tx3.status, SettlementStatus::Successful);
    assert!(tx3.user_confirmed && tx3.seller_confirmed);

    let audited = audit_repo::count_for_subject(&pool, tx.id).await.unwrap();
    assert_eq!(audited, 2);
}

#[tokio::test]
async fn test_reconciler_recreates_missing_ledger() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let outcome = common::place_pickup_order(&pool, Uuid::new_v4(), Uuid::new_v4(), 10_000).await;
    let order_id = outcome.order.id;

    // Simulate the soft-consistency failure mode: the order exists but its
    // ledger write was lost, leaving only the outbox task behind.
    sqlx::query("DELETE FROM transactions WHERE order_id = $1")
        .bind(order_id)
        .execute(&pool)
        .await
        .unwrap();
    outbox_repo::enqueue(&pool, order_id, "connection reset").await.unwrap();

    let reconciled = ledger_reconciler::reconcile_pending(&pool).await.unwrap();
    assert!(reconciled >= 1);

    let tx = transaction_repo::get_by_order(&pool, order_id)
        .await
        .unwrap()
        .expect("ledger must be recreated");
    assert_eq!(tx.total_amount, 10_500);
    assert_eq!(tx.service_charge_amount, 1_050);
    assert_eq!(tx.amount_to_seller, 9_450);

    // The outbox task is gone once the ledger exists again.
    let still_pending: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM ledger_outbox WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(still_pending, 0);
}
