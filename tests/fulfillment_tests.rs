mod common;

use uuid::Uuid;

use okadamart::engine::checkout::{checkout, CheckoutItem, CheckoutRequest, ShippingSelection};
use okadamart::engine::delivery::{self, LastLocation, ProgressUpdate};
use okadamart::engine::dispatch;
use okadamart::errors::AppError;
use okadamart::models::{OrderStatus, RiderStatus, ShippingMethod, ShippingStatus};
use okadamart::pricing;

#[tokio::test]
async fn test_delivery_checkout_prices_by_distance() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let seller_loc = pricing::Coordinates { lat: 6.4541, lng: 3.3947 };
    let buyer_loc = pricing::Coordinates { lat: 6.6018, lng: 3.3515 };
    let expected = pricing::quote(seller_loc, buyer_loc).unwrap();

    let req = CheckoutRequest {
        items: common::cart(2_000, 1),
        shipping: ShippingSelection {
            method: ShippingMethod::Delivery,
            seller_lat: Some(seller_loc.lat),
            seller_lng: Some(seller_loc.lng),
            user_lat: Some(buyer_loc.lat),
            user_lng: Some(buyer_loc.lng),
            details: common::pickup_shipping().details,
        },
        seller_id: Some(Uuid::new_v4()),
    };

    let outcome = checkout(&pool, Uuid::new_v4(), req).await.unwrap();
    assert_eq!(outcome.order.shipping_method, ShippingMethod::Delivery);
    assert_eq!(outcome.order.shipping_fee, expected.fare);
    assert_eq!(
        outcome.order.distance_minutes_estimated,
        expected.estimated_minutes
    );
    assert!(outcome.order.distance_minutes_estimated >= 1);
    assert_eq!(outcome.order.total, 2_000 + expected.fare);
}

#[tokio::test]
async fn test_delivery_checkout_without_coords_uses_flat_fee() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let req = CheckoutRequest {
        items: common::cart(2_000, 1),
        shipping: ShippingSelection {
            method: ShippingMethod::Delivery,
            seller_lat: None,
            seller_lng: None,
            user_lat: None,
            user_lng: None,
            details: common::pickup_shipping().details,
        },
        seller_id: Some(Uuid::new_v4()),
    };

    let outcome = checkout(&pool, Uuid::new_v4(), req).await.unwrap();
    assert_eq!(outcome.order.shipping_fee, 700);
    assert_eq!(outcome.order.distance_minutes_estimated, 0);
    assert_eq!(outcome.order.total, 2_700);
}

#[tokio::test]
async fn test_checkout_rejects_out_of_range_amounts() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    // Quantity wider than the column type.
    let oversized = CheckoutRequest {
        items: vec![CheckoutItem {
            product_id: "prod-huge-qty".into(),
            name: String::new(),
            price: 100,
            qty: i64::from(i32::MAX) + 1,
        }],
        shipping: common::pickup_shipping(),
        seller_id: None,
    };
    let err = checkout(&pool, Uuid::new_v4(), oversized)
        .await
        .expect_err("oversized quantity must fail");
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    // Line total that overflows i64.
    let overflowing = CheckoutRequest {
        items: vec![CheckoutItem {
            product_id: "prod-overflow".into(),
            name: String::new(),
            price: i64::MAX / 2 + 1,
            qty: 2,
        }],
        shipping: common::pickup_shipping(),
        seller_id: None,
    };
    let err = checkout(&pool, Uuid::new_v4(), overflowing)
        .await
        .expect_err("overflowing subtotal must fail");
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
}

#[tokio::test]
async fn test_assign_rider_and_conflict_when_busy() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let rider = common::seed_rider(&pool, "Musa").await;
    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();

    let first = common::place_pickup_order(&pool, buyer, seller, 2_000).await;
    let second = common::place_pickup_order(&pool, buyer, seller, 3_000).await;

    let order = dispatch::assign_rider(&pool, first.order.id, rider.id)
        .await
        .expect("first assignment should succeed");
    assert_eq!(order.shipping_status, ShippingStatus::RiderAssigned);
    assert_eq!(order.rider_id, Some(rider.id));
    assert_eq!(order.rider_name.as_deref(), Some("Musa"));

    // The same rider cannot be claimed for a second order.
    let err = dispatch::assign_rider(&pool, second.order.id, rider.id)
        .await
        .expect_err("second assignment must fail");
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn test_concurrent_assignment_exactly_one_wins() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let rider = common::seed_rider(&pool, "Chidi").await;
    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();

    let a = common::place_pickup_order(&pool, buyer, seller, 1_000).await;
    let b = common::place_pickup_order(&pool, buyer, seller, 1_000).await;

    let pool_a = pool.clone();
    let pool_b = pool.clone();
    let (order_a, order_b) = (a.order.id, b.order.id);
    let (rider_a, rider_b) = (rider.id, rider.id);

    let (res_a, res_b) = tokio::join!(
        tokio::spawn(async move { dispatch::assign_rider(&pool_a, order_a, rider_a).await }),
        tokio::spawn(async move { dispatch::assign_rider(&pool_b, order_b, rider_b).await }),
    );

    let res_a = res_a.unwrap();
    let res_b = res_b.unwrap();
    let successes = [&res_a, &res_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one concurrent claim must win");
}

#[tokio::test]
async fn test_unknown_order_and_rider_are_not_found() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let rider = common::seed_rider(&pool, "Tunde").await;
    let err = dispatch::assign_rider(&pool, Uuid::new_v4(), rider.id)
        .await
        .expect_err("missing order");
    assert!(matches!(err, AppError::NotFound(_)));

    let outcome =
        common::place_pickup_order(&pool, Uuid::new_v4(), Uuid::new_v4(), 1_000).await;
    let err = dispatch::assign_rider(&pool, outcome.order.id, Uuid::new_v4())
        .await
        .expect_err("missing rider");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_progress_auto_advances_to_en_route() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let rider = common::seed_rider(&pool, "Kemi").await;
    let outcome = common::place_pickup_order(&pool, Uuid::new_v4(), Uuid::new_v4(), 5_000).await;
    dispatch::assign_rider(&pool, outcome.order.id, rider.id)
        .await
        .unwrap();

    let order = delivery::report_progress(
        &pool,
        outcome.order.id,
        ProgressUpdate {
            minutes_covered: Some(4.0),
            percent: Some(25.0),
            last_location: Some(LastLocation { lat: 6.52, lng: 3.38 }),
            shipping_status: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(order.shipping_status, ShippingStatus::EnRoute);
    assert_eq!(order.status, OrderStatus::OutForDelivery);
    assert_eq!(order.progress_percent, 25.0);
    assert_eq!(order.last_lat, Some(6.52));
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let rider = common::seed_rider(&pool, "Bisi").await;
    let outcome = common::place_pickup_order(&pool, Uuid::new_v4(), Uuid::new_v4(), 5_000).await;
    dispatch::assign_rider(&pool, outcome.order.id, rider.id)
        .await
        .unwrap();

    delivery::report_progress(
        &pool,
        outcome.order.id,
        ProgressUpdate {
            minutes_covered: Some(10.0),
            percent: Some(60.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // A stale report cannot roll progress back.
    let order = delivery::report_progress(
        &pool,
        outcome.order.id,
        ProgressUpdate {
            minutes_covered: Some(3.0),
            percent: Some(20.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(order.progress_minutes, 10.0);
    assert_eq!(order.progress_percent, 60.0);
}

#[tokio::test]
async fn test_full_progress_delivers_and_frees_rider() {
    // Hitting 100 percent completes both axes and returns the rider to the
    // pool.
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let rider = common::seed_rider(&pool, "Emeka").await;
    let outcome = common::place_pickup_order(&pool, Uuid::new_v4(), Uuid::new_v4(), 5_000).await;
    dispatch::assign_rider(&pool, outcome.order.id, rider.id)
        .await
        .unwrap();

    let order = delivery::report_progress(
        &pool,
        outcome.order.id,
        ProgressUpdate {
            minutes_covered: Some(22.0),
            percent: Some(100.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.shipping_status, ShippingStatus::Delivered);

    let freed = sqlx::query_as::<_, okadamart::models::Rider>(
        "SELECT * FROM riders WHERE id = $1",
    )
    .bind(rider.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(freed.status, RiderStatus::Available);

    // Delivered is terminal for progress reporting.
    let err = delivery::report_progress(
        &pool,
        outcome.order.id,
        ProgressUpdate {
            percent: Some(100.0),
            ..Default::default()
        },
    )
    .await
    .expect_err("progress after delivery must fail");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_cancel_mid_delivery_pays_rider_compensation() {
    // En route with 10 minutes covered -> compensation 250,
    // cancelled_with_fee, status failed.
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let rider = common::seed_rider(&pool, "Yemi").await;
    let buyer = Uuid::new_v4();
    let outcome = common::place_pickup_order(&pool, buyer, Uuid::new_v4(), 5_000).await;
    dispatch::assign_rider(&pool, outcome.order.id, rider.id)
        .await
        .unwrap();
    delivery::report_progress(
        &pool,
        outcome.order.id,
        ProgressUpdate {
            minutes_covered: Some(10.0),
            percent: Some(40.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let (order, compensation) =
        delivery::cancel(&pool, outcome.order.id, buyer, "changed my mind")
            .await
            .unwrap();

    assert_eq!(compensation, 250);
    assert_eq!(order.status, OrderStatus::Failed);
    assert_eq!(order.shipping_status, ShippingStatus::CancelledWithFee);
    assert_eq!(order.rider_compensation_paid, Some(250));
    assert_eq!(order.cancelled_by.as_deref(), Some("user"));

    // The rider goes back to the pool.
    let freed = sqlx::query_as::<_, okadamart::models::Rider>(
        "SELECT * FROM riders WHERE id = $1",
    )
    .bind(rider.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(freed.status, RiderStatus::Available);

    // A second cancel must conflict, never double-pay.
    let err = delivery::cancel(&pool, outcome.order.id, buyer, "again")
        .await
        .expect_err("double cancel must fail");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_cancel_before_pickup_pays_nothing() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let buyer = Uuid::new_v4();
    let outcome = common::place_pickup_order(&pool, buyer, Uuid::new_v4(), 2_000).await;

    let (order, compensation) = delivery::cancel(&pool, outcome.order.id, buyer, "").await.unwrap();

    assert_eq!(compensation, 0);
    assert_eq!(order.shipping_status, ShippingStatus::CancelledNoFee);
    assert_eq!(order.status, OrderStatus::Failed);
    assert_eq!(order.rider_compensation_paid, Some(0));
}

#[tokio::test]
async fn test_cancel_is_owner_only_and_blocked_after_delivery() {
    let pool = common::setup_test_db().await;
    common::set_fees(&pool, 500, 700).await;

    let rider = common::seed_rider(&pool, "Ifeanyi").await;
    let buyer = Uuid::new_v4();
    let outcome = common::place_pickup_order(&pool, buyer, Uuid::new_v4(), 2_000).await;

    let err = delivery::cancel(&pool, outcome.order.id, Uuid::new_v4(), "not mine")
        .await
        .expect_err("stranger cancel must fail");
    assert!(matches!(err, AppError::Forbidden(_)));

    dispatch::assign_rider(&pool, outcome.order.id, rider.id)
        .await
        .unwrap();
    delivery::report_progress(
        &pool,
        outcome.order.id,
        ProgressUpdate {
            percent: Some(100.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let err = delivery::cancel(&pool, outcome.order.id, buyer, "too late")
        .await
        .expect_err("cancel after delivery must fail");
    assert!(matches!(err, AppError::Conflict(_)));
}
