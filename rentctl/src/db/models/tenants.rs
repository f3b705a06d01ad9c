//! Database models for tenants.

use crate::types::{RoomId, TenantId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Database representation of a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tenant {
    pub id: TenantId,
    pub citizen_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub move_in_date: NaiveDate,
    /// The occupied room. May be `None` for a tenant detached by a consistency repair.
    pub room_id: Option<RoomId>,
    pub old_meter_reading: i64,
    pub new_meter_reading: i64,
    pub total_cost: Decimal,
    pub is_paid: bool,
    /// Last billing period (`YYYY-MM`) this tenancy was rolled into
    pub billing_period: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a tenant. New tenants start unpaid with zeroed meters and charges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantCreateDBRequest {
    pub citizen_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub move_in_date: NaiveDate,
    pub room_id: RoomId,
}

/// Request to update tenant fields. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantUpdateDBRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub move_in_date: Option<NaiveDate>,
    pub old_meter_reading: Option<i64>,
    pub new_meter_reading: Option<i64>,
    pub total_cost: Option<Decimal>,
    pub is_paid: Option<bool>,
    pub billing_period: Option<String>,
}

pub type TenantDBResponse = Tenant;
