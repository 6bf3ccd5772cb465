use metrics::counter;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{order_repo, outbox_repo, settings_repo, transaction_repo};
use crate::errors::AppError;
use crate::models::{
    NewOrder, NewOrderItem, NewTransaction, Order, OrderItem, ShippingMethod, Transaction,
};
use crate::pricing;

// ---------------------------------------------------------------------------
// Request shapes
// ---------------------------------------------------------------------------

fn default_qty() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItem {
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    pub price: i64,
    #[serde(default = "default_qty")]
    pub qty: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecipientDetails {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingSelection {
    pub method: ShippingMethod,
    pub seller_lat: Option<f64>,
    pub seller_lng: Option<f64>,
    pub user_lat: Option<f64>,
    pub user_lng: Option<f64>,
    #[serde(default)]
    pub details: RecipientDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    pub shipping: ShippingSelection,
    pub seller_id: Option<Uuid>,
}

/// Result of a checkout. `ledger_pending` flags the soft-consistency case:
/// the order was persisted but its settlement ledger was not, and a
/// reconciliation task has been queued.
#[derive(Debug)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub transaction: Option<Transaction>,
    pub ledger_pending: bool,
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// Turn a cart into a priced order plus its settlement ledger.
///
/// The shipping fee comes from the distance calculator when the client sent
/// all four coordinates for a delivery, and from the platform's flat fees
/// otherwise — a missing GPS reading never fails the order.
pub async fn checkout(
    pool: &PgPool,
    buyer: Uuid,
    req: CheckoutRequest,
) -> Result<CheckoutOutcome, AppError> {
    if req.items.is_empty() {
        return Err(AppError::BadRequest("cart is empty".into()));
    }

    let mut subtotal: i64 = 0;
    let mut items = Vec::with_capacity(req.items.len());
    for item in &req.items {
        if item.qty < 1 {
            return Err(AppError::BadRequest(format!(
                "quantity must be at least 1 for product {}",
                item.product_id
            )));
        }
        if item.price < 0 {
            return Err(AppError::BadRequest(format!(
                "price must not be negative for product {}",
                item.product_id
            )));
        }
        let qty = i32::try_from(item.qty).map_err(|_| {
            AppError::BadRequest(format!(
                "quantity is out of range for product {}",
                item.product_id
            ))
        })?;
        subtotal = item
            .price
            .checked_mul(item.qty)
            .and_then(|line_total| subtotal.checked_add(line_total))
            .ok_or_else(|| AppError::BadRequest("order total is out of range".into()))?;
        items.push(NewOrderItem {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            qty,
            unit_price: item.price,
        });
    }

    let (shipping_fee, distance_minutes_estimated) =
        resolve_shipping_fee(pool, &req.shipping).await?;

    let total = subtotal
        .checked_add(shipping_fee)
        .ok_or_else(|| AppError::BadRequest("order total is out of range".into()))?;
    let commission = pricing::commission(total);

    let details = &req.shipping.details;
    let new_order = NewOrder {
        user_id: buyer,
        seller_id: req.seller_id,
        total,
        commission,
        shipping_method: req.shipping.method,
        shipping_fee,
        recipient_name: details.name.clone(),
        recipient_phone: details.phone.clone(),
        recipient_address: details.address.clone(),
        recipient_city: details.city.clone(),
        distance_minutes_estimated,
        items,
    };

    let (order, items) = order_repo::insert_order(pool, &new_order).await?;
    counter!("orders_created_total").increment(1);

    tracing::info!(
        order_id = %order.id,
        total = order.total,
        shipping_fee = order.shipping_fee,
        "Order created"
    );

    // The ledger is created alongside the order but not in the same
    // transaction: the buyer must not lose their order over a bookkeeping
    // failure. A failed ledger write is queued for the reconciler instead.
    let split = pricing::split(total, pricing::SERVICE_CHARGE_PERCENT);
    let new_tx = NewTransaction {
        order_id: order.id,
        user_id: buyer,
        seller_id: req.seller_id,
        total_amount: total,
        service_charge_percent: pricing::SERVICE_CHARGE_PERCENT,
        service_charge_amount: split.service_charge_amount,
        amount_to_seller: split.amount_to_seller,
    };

    match transaction_repo::insert_transaction(pool, &new_tx).await {
        Ok(tx) => Ok(CheckoutOutcome {
            order,
            items,
            transaction: Some(tx),
            ledger_pending: false,
        }),
        Err(e) => {
            counter!("ledger_create_failures_total").increment(1);
            tracing::error!(
                order_id = %order.id,
                error = %e,
                "Ledger creation failed after order creation — queued for reconciliation"
            );
            if let Err(enqueue_err) =
                outbox_repo::enqueue(pool, order.id, &e.to_string()).await
            {
                tracing::error!(
                    order_id = %order.id,
                    error = %enqueue_err,
                    "Failed to enqueue ledger reconciliation task"
                );
            }
            Ok(CheckoutOutcome {
                order,
                items,
                transaction: None,
                ledger_pending: true,
            })
        }
    }
}

/// Pickup uses the flat pickup fee. Delivery uses the distance quote when
/// all four coordinates arrived and are usable, and the flat delivery fee
/// otherwise.
async fn resolve_shipping_fee(
    pool: &PgPool,
    shipping: &ShippingSelection,
) -> Result<(i64, i64), AppError> {
    let settings = settings_repo::get_or_create(pool).await?;

    if shipping.method == ShippingMethod::Pickup {
        return Ok((settings.pickup_fee, 0));
    }

    let coords = (
        shipping.seller_lat,
        shipping.seller_lng,
        shipping.user_lat,
        shipping.user_lng,
    );
    if let (Some(s_lat), Some(s_lng), Some(u_lat), Some(u_lng)) = coords {
        let seller = pricing::Coordinates { lat: s_lat, lng: s_lng };
        let user = pricing::Coordinates { lat: u_lat, lng: u_lng };
        match pricing::quote(seller, user) {
            Ok(quote) => return Ok((quote.fare, quote.estimated_minutes)),
            Err(e) => {
                tracing::warn!(error = %e, "Unusable coordinates — falling back to flat delivery fee");
            }
        }
    }

    Ok((settings.delivery_fee, 0))
}
