//! API request/response models for tenants.

use crate::db::models::{rooms::Room, tenants::Tenant};
use crate::occupancy::{NewTenant, TenantChanges, TenantView};
use crate::types::{RoomId, TenantId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for moving a tenant into a vacant room
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TenantCreate {
    /// The vacant room to move into
    #[schema(value_type = Option<String>, format = "uuid")]
    pub room_id: Option<RoomId>,
    #[schema(example = "Nguyen Thi Lan")]
    pub name: Option<String>,
    /// National identity number, unique per tenant
    #[schema(example = "079201001234")]
    pub citizen_id: Option<String>,
    #[schema(example = "0901234567")]
    pub phone: Option<String>,
    pub email: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    #[schema(example = "2024-03-01")]
    pub move_in_date: Option<String>,
}

impl From<TenantCreate> for NewTenant {
    fn from(body: TenantCreate) -> Self {
        Self {
            room_id: body.room_id,
            name: body.name,
            citizen_id: body.citizen_id,
            phone: body.phone,
            email: body.email,
            move_in_date: body.move_in_date,
        }
    }
}

/// Request body for editing a tenancy. A different `room_id` transfers the tenant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TenantUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub room_id: Option<RoomId>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub move_in_date: Option<String>,
}

impl From<TenantUpdate> for TenantChanges {
    fn from(body: TenantUpdate) -> Self {
        Self {
            room_id: body.room_id,
            name: body.name,
            phone: body.phone,
            email: body.email,
            move_in_date: body.move_in_date,
        }
    }
}

/// Request body for recording the latest meter reading
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MeterReadingUpdate {
    #[schema(example = 1250)]
    pub new_reading: Option<i64>,
}

/// The room a tenant occupies, as shown on the tenant
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TenantRoom {
    #[schema(value_type = String, format = "uuid")]
    pub id: RoomId,
    pub room_number: String,
    pub floor: i32,
}

impl From<&Room> for TenantRoom {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            room_number: room.room_number.clone(),
            floor: room.floor,
        }
    }
}

/// Tenant details returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TenantResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TenantId,
    pub citizen_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub move_in_date: NaiveDate,
    pub room: Option<TenantRoom>,
    pub old_meter_reading: i64,
    pub new_meter_reading: i64,
    /// Stored charge for the current period
    #[schema(value_type = String)]
    pub total_cost: Decimal,
    pub is_paid: bool,
    /// Last period (`YYYY-MM`) this tenancy was rolled into
    pub billing_period: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantResponse {
    fn build(tenant: Tenant, room: Option<&Room>) -> Self {
        Self {
            id: tenant.id,
            citizen_id: tenant.citizen_id,
            name: tenant.name,
            phone: tenant.phone,
            email: tenant.email,
            move_in_date: tenant.move_in_date,
            room: room.map(TenantRoom::from),
            old_meter_reading: tenant.old_meter_reading,
            new_meter_reading: tenant.new_meter_reading,
            total_cost: tenant.total_cost,
            is_paid: tenant.is_paid,
            billing_period: tenant.billing_period,
            created_at: tenant.created_at,
            updated_at: tenant.updated_at,
        }
    }
}

impl From<Tenant> for TenantResponse {
    fn from(tenant: Tenant) -> Self {
        Self::build(tenant, None)
    }
}

impl From<TenantView> for TenantResponse {
    fn from(view: TenantView) -> Self {
        Self::build(view.tenant, view.room.as_ref())
    }
}
