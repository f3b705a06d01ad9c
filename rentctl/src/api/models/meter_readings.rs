//! API request/response models for the meter feed.

use crate::db::models::meter_readings::{MeterReading, MeterReadingUpsertDBRequest};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for storing the feed record of one room
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MeterReadingUpsert {
    /// Reading at the start of the period
    #[schema(example = 1200)]
    pub old_reading: Option<i64>,
    /// Latest reading
    #[schema(example = 1250)]
    pub new_reading: Option<i64>,
}

impl MeterReadingUpsert {
    pub fn into_request(self, room_number: String) -> Result<MeterReadingUpsertDBRequest> {
        Ok(MeterReadingUpsertDBRequest {
            room_number,
            old_reading: self.old_reading.unwrap_or(0),
            new_reading: self
                .new_reading
                .ok_or_else(|| Error::invalid_input("new_reading is required"))?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MeterReadingResponse {
    pub room_number: String,
    pub old_reading: i64,
    pub new_reading: i64,
    pub recorded_at: DateTime<Utc>,
}

impl From<MeterReading> for MeterReadingResponse {
    fn from(reading: MeterReading) -> Self {
        Self {
            room_number: reading.room_number,
            old_reading: reading.old_reading,
            new_reading: reading.new_reading,
            recorded_at: reading.recorded_at,
        }
    }
}
