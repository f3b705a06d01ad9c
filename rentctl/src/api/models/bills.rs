//! API request/response models for invoice records.

use crate::db::models::bills::{Bill, BillCreateDBRequest, BillFilter, BillUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::{BillId, RoomId, TenantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing bills
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListBillsQuery {
    #[param(value_type = Option<String>, format = "uuid")]
    pub tenant_id: Option<TenantId>,
    #[param(value_type = Option<String>, format = "uuid")]
    pub room_id: Option<RoomId>,
}

impl From<ListBillsQuery> for BillFilter {
    fn from(query: ListBillsQuery) -> Self {
        Self {
            tenant_id: query.tenant_id,
            room_id: query.room_id,
        }
    }
}

/// Request body for recording a bill by hand. The total is always derived.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BillCreate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub room_id: Option<RoomId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub tenant_id: Option<TenantId>,
    #[schema(value_type = Option<String>)]
    pub electricity: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub water: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub room_price: Option<Decimal>,
}

impl TryFrom<BillCreate> for BillCreateDBRequest {
    type Error = Error;

    fn try_from(body: BillCreate) -> Result<Self> {
        let missing = |field: &str| Error::invalid_input(format!("{field} is required"));
        Ok(Self {
            room_id: body.room_id.ok_or_else(|| missing("room_id"))?,
            tenant_id: body.tenant_id.ok_or_else(|| missing("tenant_id"))?,
            electricity: body.electricity.unwrap_or_default(),
            water: body.water.unwrap_or_default(),
            room_price: body.room_price.ok_or_else(|| missing("room_price"))?,
        })
    }
}

/// Request body for editing a bill's amounts
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BillUpdate {
    #[schema(value_type = Option<String>)]
    pub electricity: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub water: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub room_price: Option<Decimal>,
}

impl From<BillUpdate> for BillUpdateDBRequest {
    fn from(body: BillUpdate) -> Self {
        Self {
            electricity: body.electricity,
            water: body.water,
            room_price: body.room_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: BillId,
    #[schema(value_type = String, format = "uuid")]
    pub room_id: RoomId,
    #[schema(value_type = String, format = "uuid")]
    pub tenant_id: TenantId,
    #[schema(value_type = String)]
    pub electricity: Decimal,
    #[schema(value_type = String)]
    pub water: Decimal,
    #[schema(value_type = String)]
    pub room_price: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Bill> for BillResponse {
    fn from(bill: Bill) -> Self {
        Self {
            id: bill.id,
            room_id: bill.room_id,
            tenant_id: bill.tenant_id,
            electricity: bill.electricity,
            water: bill.water,
            room_price: bill.room_price,
            total: bill.total,
            created_at: bill.created_at,
            updated_at: bill.updated_at,
        }
    }
}
