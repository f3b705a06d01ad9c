//! Electricity meter feed.
//!
//! Billing runs read meter records through [`MeterReadingSource`]. The bundled source,
//! [`StoredMeterFeed`], keeps one record per room number in the store; whatever collects the
//! readings writes them through [`StoredMeterFeed::record`].

use crate::{
    billing::charges::MAX_METER_READING,
    db::models::meter_readings::{MeterReading, MeterReadingUpsertDBRequest},
    errors::{Error, Result},
    store::Store,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

/// Where billing runs get meter readings from
#[async_trait]
pub trait MeterReadingSource: Send + Sync {
    /// Every available record, at most one per room number
    async fn readings(&self) -> Result<Vec<MeterReading>>;
}

/// Meter feed kept in the store's `meter_readings` table
#[derive(Clone)]
pub struct StoredMeterFeed {
    store: Arc<dyn Store>,
}

impl StoredMeterFeed {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Insert or replace the record for a room number
    #[instrument(skip(self, request), fields(room_number = %request.room_number), err)]
    pub async fn record(&self, request: &MeterReadingUpsertDBRequest) -> Result<MeterReading> {
        if request.room_number.trim().is_empty() {
            return Err(Error::invalid_input("room_number is required"));
        }
        let range = 0..=MAX_METER_READING;
        if !range.contains(&request.old_reading) || !range.contains(&request.new_reading) {
            return Err(Error::invalid_input(format!(
                "Meter readings must be between 0 and {MAX_METER_READING}"
            )));
        }

        let mut tx = self.store.begin().await?;
        let reading = tx.upsert_meter_reading(request).await?;
        tx.commit().await?;
        Ok(reading)
    }
}

#[async_trait]
impl MeterReadingSource for StoredMeterFeed {
    async fn readings(&self) -> Result<Vec<MeterReading>> {
        let mut tx = self.store.begin().await?;
        let readings = tx.meter_readings().await?;
        tx.commit().await?;
        Ok(readings)
    }
}
