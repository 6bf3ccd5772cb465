pub mod order;
pub mod outbox;
pub mod rider;
pub mod settings;
pub mod transaction;

pub use order::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, ShippingMethod, ShippingStatus,
};
pub use outbox::LedgerOutbox;
pub use rider::{Rider, RiderStatus};
pub use settings::Settings;
pub use transaction::{NewTransaction, SettlementStatus, Transaction};

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Caller role, supplied by the auth gateway on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
    Rider,
    Admin,
}

impl Role {
    pub fn from_header_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buyer" | "user" => Some(Role::Buyer),
            "seller" => Some(Role::Seller),
            "rider" => Some(Role::Rider),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Buyer => write!(f, "buyer"),
            Role::Seller => write!(f, "seller"),
            Role::Rider => write!(f, "rider"),
            Role::Admin => write!(f, "admin"),
        }
    }
}
