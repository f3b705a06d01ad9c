//! Database models for invoice records.

use crate::types::{BillId, RoomId, TenantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Database representation of a bill. `total` always equals the sum of the three components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bill {
    pub id: BillId,
    pub room_id: RoomId,
    pub tenant_id: TenantId,
    pub electricity: Decimal,
    pub water: Decimal,
    pub room_price: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a bill. The total is derived, never supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillCreateDBRequest {
    pub room_id: RoomId,
    pub tenant_id: TenantId,
    pub electricity: Decimal,
    pub water: Decimal,
    pub room_price: Decimal,
}

impl BillCreateDBRequest {
    pub fn total(&self) -> Decimal {
        self.electricity + self.water + self.room_price
    }
}

/// Request to edit bill amounts; the total is recomputed from the resulting components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillUpdateDBRequest {
    pub electricity: Option<Decimal>,
    pub water: Option<Decimal>,
    pub room_price: Option<Decimal>,
}

/// Filter for listing bills
#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    pub tenant_id: Option<TenantId>,
    pub room_id: Option<RoomId>,
}

pub type BillDBResponse = Bill;
