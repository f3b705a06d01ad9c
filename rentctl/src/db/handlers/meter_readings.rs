//! Database repository for the electricity meter feed.

use crate::db::{
    errors::Result,
    models::meter_readings::{MeterReading, MeterReadingUpsertDBRequest},
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct MeterReadings<'c> {
    db: &'c mut PgConnection,
}

impl<'c> MeterReadings<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<MeterReading>> {
        let readings = sqlx::query_as::<_, MeterReading>(
            "SELECT room_number, old_reading, new_reading, recorded_at FROM meter_readings ORDER BY room_number",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(readings)
    }

    /// Insert or replace the feed record for a room number
    #[instrument(skip(self, request), fields(room_number = %request.room_number), err)]
    pub async fn upsert(&mut self, request: &MeterReadingUpsertDBRequest) -> Result<MeterReading> {
        let reading = sqlx::query_as::<_, MeterReading>(
            r#"
            INSERT INTO meter_readings (room_number, old_reading, new_reading, recorded_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (room_number) DO UPDATE
            SET old_reading = EXCLUDED.old_reading,
                new_reading = EXCLUDED.new_reading,
                recorded_at = EXCLUDED.recorded_at
            RETURNING room_number, old_reading, new_reading, recorded_at
            "#,
        )
        .bind(&request.room_number)
        .bind(request.old_reading)
        .bind(request.new_reading)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(reading)
    }
}
