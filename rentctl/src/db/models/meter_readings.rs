//! Database models for the electricity meter feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One feed record per room number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MeterReading {
    pub room_number: String,
    pub old_reading: i64,
    pub new_reading: i64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterReadingUpsertDBRequest {
    pub room_number: String,
    pub old_reading: i64,
    pub new_reading: i64,
}
