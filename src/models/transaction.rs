use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::OrderStatus;

/// Settlement axis of the ledger. Deliberately its own enum even though the
/// variants mirror [`OrderStatus`]: the two machines are kept in sync by the
/// controlling operation, never by either entity on its own. The settlement
/// path proper is pending → payment_confirmed → approved → successful (or
/// failed); the remaining variants exist so a seller-side order update can
/// fan out verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "settlement_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
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

impl SettlementStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SettlementStatus::Successful | SettlementStatus::Failed)
    }

    /// Dual confirmation only promotes the ledger from these states.
    pub fn confirmable(self) -> bool {
        matches!(
            self,
            SettlementStatus::Approved | SettlementStatus::PaymentConfirmed
        )
    }
}

impl From<OrderStatus> for SettlementStatus {
    fn from(s: OrderStatus) -> Self {
        match s {
            OrderStatus::Pending => SettlementStatus::Pending,
            OrderStatus::Processing => SettlementStatus::Processing,
            OrderStatus::Transferred => SettlementStatus::Transferred,
            OrderStatus::PaymentConfirmed => SettlementStatus::PaymentConfirmed,
            OrderStatus::Approved => SettlementStatus::Approved,
            OrderStatus::Successful => SettlementStatus::Successful,
            OrderStatus::OutForDelivery => SettlementStatus::OutForDelivery,
            OrderStatus::Delivered => SettlementStatus::Delivered,
            OrderStatus::Failed => SettlementStatus::Failed,
        }
    }
}

/// Database row for the transactions table — the settlement ledger, one per
/// order. `total_amount` is duplicated from the order at creation so the
/// ledger survives later corrections to the order record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub seller_id: Option<Uuid>,

    pub total_amount: i64,
    pub service_charge_percent: i32,
    pub service_charge_amount: i64,
    pub amount_to_seller: i64,

    pub status: SettlementStatus,
    pub user_confirmed: bool,
    pub seller_confirmed: bool,

    pub payment_proof: Option<String>,
    pub admin_note: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub seller_id: Option<Uuid>,
    pub total_amount: i64,
    pub service_charge_percent: i32,
    pub service_charge_amount: i64,
    pub amount_to_seller: i64,
}
