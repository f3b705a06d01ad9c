//! Billing export.
//!
//! An export is a snapshot of every occupied room's charges, one [`ExportRow`] per room, handed
//! to an [`ExportSink`]. The bundled [`JsonFileSink`] writes each snapshot to its own JSON file.

use crate::{
    billing::Statement,
    errors::{Error, Result},
    types::abbrev_uuid,
};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// One exported room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExportRow {
    pub room_number: String,
    pub floor: i32,
    pub tenant_name: String,
    pub meter_old: i64,
    pub meter_new: i64,
    #[schema(value_type = String)]
    pub electricity_cost: Decimal,
    #[schema(value_type = String)]
    pub water_cost: Decimal,
    #[schema(value_type = String)]
    pub room_cost: Decimal,
    #[schema(value_type = String)]
    pub total_cost: Decimal,
    pub paid: bool,
}

impl From<&Statement> for ExportRow {
    fn from(statement: &Statement) -> Self {
        Self {
            room_number: statement.room_number.clone(),
            floor: statement.floor,
            tenant_name: statement.tenant_name.clone(),
            meter_old: statement.old_meter_reading,
            meter_new: statement.new_meter_reading,
            electricity_cost: statement.charges.electricity,
            water_cost: statement.charges.water,
            room_cost: statement.charges.room_price,
            total_cost: statement.amount_due,
            paid: statement.is_paid,
        }
    }
}

/// Where a written export ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExportReceipt {
    pub location: String,
    pub rows: usize,
}

/// Destination for billing exports
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn write(&self, rows: &[ExportRow]) -> Result<ExportReceipt>;
}

/// Writes each export as a pretty-printed JSON array into a directory
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    directory: PathBuf,
}

impl JsonFileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl ExportSink for JsonFileSink {
    #[instrument(skip_all, fields(rows = rows.len()), err)]
    async fn write(&self, rows: &[ExportRow]) -> Result<ExportReceipt> {
        tokio::fs::create_dir_all(&self.directory).await.map_err(|e| Error::Internal {
            operation: format!("create export directory: {e}"),
        })?;

        let file_name = format!(
            "billing-{}-{}.json",
            Utc::now().format("%Y%m%d%H%M%S"),
            abbrev_uuid(&Uuid::new_v4())
        );
        let path = self.directory.join(file_name);

        let body = serde_json::to_vec_pretty(rows).map_err(|e| Error::Internal {
            operation: format!("serialize export: {e}"),
        })?;
        tokio::fs::write(&path, body).await.map_err(|e| Error::Internal {
            operation: format!("write export file: {e}"),
        })?;

        let location = path.display().to_string();
        info!(%location, "Billing export written");
        Ok(ExportReceipt {
            location,
            rows: rows.len(),
        })
    }
}
