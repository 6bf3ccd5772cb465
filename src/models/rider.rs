use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Availability of a rider. Exactly one order may hold a `busy` rider at a
/// time; the dispatch engine enforces this with a conditional update, never
/// a read-then-write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rider_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RiderStatus {
    Available,
    Busy,
    Inactive,
}

/// Database row for the riders pool. Admin-managed; riders never
/// self-register.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rider {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub status: RiderStatus,

    // Optional last known location.
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
