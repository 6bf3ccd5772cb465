use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Outbox row for an order whose ledger creation failed at checkout. The
/// reconciler retries these until the transaction row exists.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LedgerOutbox {
    pub id: i64,
    pub order_id: Uuid,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
