use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Status axes
// ---------------------------------------------------------------------------

/// Business lifecycle of an order (buyer/seller-facing axis).
///
/// Kept separate from [`ShippingStatus`] on purpose: a logistics failure
/// (rider problem) is orthogonal to a payment failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Transferred,
    PaymentConfirmed,
    Approved,
    Successful,
    OutForDelivery,
    Delivered,
    Failed,
}

impl OrderStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Successful | OrderStatus::Delivered | OrderStatus::Failed
        )
    }
}

/// Logistics axis of an order, driven by rider activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "shipping_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatus {
    NotAssigned,
    RiderAssigned,
    PickedUp,
    EnRoute,
    Arrived,
    Delivered,
    CancelledWithFee,
    CancelledNoFee,
}

impl ShippingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ShippingStatus::Delivered
                | ShippingStatus::CancelledWithFee
                | ShippingStatus::CancelledNoFee
        )
    }

    /// The rider has physically engaged with the package; cancelling now
    /// owes them compensation for distance already covered.
    pub fn rider_engaged(self) -> bool {
        matches!(
            self,
            ShippingStatus::PickedUp | ShippingStatus::EnRoute | ShippingStatus::Arrived
        )
    }

    /// Values a rider may report directly in a progress update.
    pub fn reportable_by_rider(self) -> bool {
        matches!(
            self,
            ShippingStatus::PickedUp
                | ShippingStatus::EnRoute
                | ShippingStatus::Arrived
                | ShippingStatus::Delivered
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "shipping_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    Pickup,
    Delivery,
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// Database row for the orders table. Monetary fields are integer currency
/// units; the shipping and rider sub-documents are flattened into columns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub seller_id: Option<Uuid>,

    pub total: i64,
    pub commission: i64,

    pub status: OrderStatus,
    pub shipping_status: ShippingStatus,

    // Shipping snapshot captured at creation — never recalculated.
    pub shipping_method: ShippingMethod,
    pub shipping_fee: i64,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub recipient_city: String,
    pub distance_minutes_estimated: i64,

    // Rider snapshot, populated at assignment.
    pub rider_id: Option<Uuid>,
    pub rider_name: Option<String>,
    pub rider_phone: Option<String>,

    // Progress tracking for the delivery in flight.
    pub progress_minutes: f64,
    pub progress_percent: f64,
    pub last_lat: Option<f64>,
    pub last_lng: Option<f64>,
    pub last_seen_at: Option<DateTime<Utc>>,

    // Cancellation metadata — write-once.
    pub cancelled_by: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub rider_compensation_paid: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled_at.is_some()
    }
}

/// Line-item snapshot; prices recorded at order time are immutable.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: Uuid,
    pub product_id: String,
    pub name: String,
    pub qty: i32,
    pub unit_price: i64,
    pub position: i32,
}

// ---------------------------------------------------------------------------
// Insert payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: String,
    pub name: String,
    pub qty: i32,
    pub unit_price: i64,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub seller_id: Option<Uuid>,
    pub total: i64,
    pub commission: i64,
    pub shipping_method: ShippingMethod,
    pub shipping_fee: i64,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub recipient_city: String,
    pub distance_minutes_estimated: i64,
    pub items: Vec<NewOrderItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Successful.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::OutForDelivery.is_terminal());

        assert!(ShippingStatus::CancelledWithFee.is_terminal());
        assert!(ShippingStatus::Delivered.is_terminal());
        assert!(!ShippingStatus::Arrived.is_terminal());
    }

    #[test]
    fn test_rider_engagement() {
        assert!(ShippingStatus::PickedUp.rider_engaged());
        assert!(ShippingStatus::EnRoute.rider_engaged());
        assert!(ShippingStatus::Arrived.rider_engaged());
        assert!(!ShippingStatus::RiderAssigned.rider_engaged());
        assert!(!ShippingStatus::Delivered.rider_engaged());
    }

    #[test]
    fn test_reportable_statuses() {
        assert!(ShippingStatus::Delivered.reportable_by_rider());
        assert!(!ShippingStatus::NotAssigned.reportable_by_rider());
        assert!(!ShippingStatus::CancelledNoFee.reportable_by_rider());
    }

    #[test]
    fn test_status_serde_names() {
        let s = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(s, "\"out_for_delivery\"");
        let back: ShippingStatus = serde_json::from_str("\"cancelled_with_fee\"").unwrap();
        assert_eq!(back, ShippingStatus::CancelledWithFee);
    }
}
