//! Database models for rooms.

use crate::types::{RoomId, TenantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Occupancy status of a room. Derived from the tenant reference, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Vacant,
    Occupied,
}

/// Database representation of a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Room {
    pub id: RoomId,
    pub room_number: String,
    pub floor: i32,
    pub price: Decimal,
    pub bathroom_count: i32,
    pub shower_count: i32,
    pub tenant_id: Option<TenantId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn status(&self) -> RoomStatus {
        match self.tenant_id {
            Some(_) => RoomStatus::Occupied,
            None => RoomStatus::Vacant,
        }
    }

    pub fn is_vacant(&self) -> bool {
        self.tenant_id.is_none()
    }

    pub fn fixture_count(&self) -> i32 {
        self.bathroom_count + self.shower_count
    }
}

/// Request to create a new room. Rooms are always created vacant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCreateDBRequest {
    pub room_number: String,
    pub floor: i32,
    pub price: Decimal,
    pub bathroom_count: i32,
    pub shower_count: i32,
}

/// Request to update room attributes. The tenant reference is changed separately.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomUpdateDBRequest {
    pub room_number: Option<String>,
    pub floor: Option<i32>,
    pub price: Option<Decimal>,
    pub bathroom_count: Option<i32>,
    pub shower_count: Option<i32>,
}

impl RoomUpdateDBRequest {
    /// Whether applying this update changes what the occupant is charged
    pub fn changes_charges(&self, room: &Room) -> bool {
        self.price.is_some_and(|p| p != room.price)
            || self.bathroom_count.is_some_and(|c| c != room.bathroom_count)
            || self.shower_count.is_some_and(|c| c != room.shower_count)
    }
}

pub type RoomDBResponse = Room;
