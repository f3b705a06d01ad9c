//! API request/response models for rooms.

use crate::db::models::{
    rooms::{Room, RoomStatus},
    tenants::Tenant,
};
use crate::occupancy::{NewRoom, RoomChanges, RoomView};
use crate::types::{RoomId, TenantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing rooms
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListRoomsQuery {
    /// Only occupied (`true`) or only vacant (`false`) rooms
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub occupied: Option<bool>,
}

/// Request body for creating a room. Rooms are always created vacant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RoomCreate {
    /// Unique room number
    #[schema(example = "101")]
    pub room_number: Option<String>,
    #[schema(example = 1)]
    pub floor: Option<i32>,
    /// Monthly rent
    #[schema(value_type = Option<String>, example = "3000000")]
    pub price: Option<Decimal>,
    /// Defaults to 1
    pub bathroom_count: Option<i32>,
    /// Defaults to 1
    pub shower_count: Option<i32>,
}

impl From<RoomCreate> for NewRoom {
    fn from(body: RoomCreate) -> Self {
        Self {
            room_number: body.room_number,
            floor: body.floor,
            price: body.price,
            bathroom_count: body.bathroom_count,
            shower_count: body.shower_count,
        }
    }
}

/// Request body for updating a room. Only provided fields are changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RoomUpdate {
    pub room_number: Option<String>,
    pub floor: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub bathroom_count: Option<i32>,
    pub shower_count: Option<i32>,
}

impl From<RoomUpdate> for RoomChanges {
    fn from(body: RoomUpdate) -> Self {
        Self {
            room_number: body.room_number,
            floor: body.floor,
            price: body.price,
            bathroom_count: body.bathroom_count,
            shower_count: body.shower_count,
        }
    }
}

/// The occupant of a room, as shown on the room
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoomOccupant {
    #[schema(value_type = String, format = "uuid")]
    pub id: TenantId,
    pub name: String,
    pub citizen_id: String,
}

impl From<&Tenant> for RoomOccupant {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name.clone(),
            citizen_id: tenant.citizen_id.clone(),
        }
    }
}

/// Room details returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoomResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: RoomId,
    pub room_number: String,
    pub floor: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub bathroom_count: i32,
    pub shower_count: i32,
    /// Derived from whether a tenant occupies the room
    pub status: RoomStatus,
    pub tenant: Option<RoomOccupant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomResponse {
    fn build(room: Room, tenant: Option<&Tenant>) -> Self {
        Self {
            status: room.status(),
            id: room.id,
            room_number: room.room_number,
            floor: room.floor,
            price: room.price,
            bathroom_count: room.bathroom_count,
            shower_count: room.shower_count,
            tenant: tenant.map(RoomOccupant::from),
            created_at: room.created_at,
            updated_at: room.updated_at,
        }
    }
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self::build(room, None)
    }
}

impl From<RoomView> for RoomResponse {
    fn from(view: RoomView) -> Self {
        Self::build(view.room, view.tenant.as_ref())
    }
}
