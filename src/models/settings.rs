use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Platform-wide fallback fees, used by checkout when geolocation is
/// unavailable. Single row, lazily created with zero defaults.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Settings {
    #[serde(skip)]
    pub id: i16,
    pub pickup_fee: i64,
    pub delivery_fee: i64,
    pub updated_at: DateTime<Utc>,
}
