//! Transactional record store shared by the occupancy and billing components.
//!
//! Every multi-record operation opens a [`StoreTx`], performs its checks and writes through it,
//! and then commits. Dropping a transaction without committing discards all of its writes, so a
//! failure half-way through an operation can never leave a room and its tenant disagreeing.
//!
//! Reads of single records by id or natural key lock the record for the rest of the transaction,
//! so precondition checks run against the latest committed state.
//!
//! Two backends implement the traits:
//!
//! - [`in_memory::InMemoryStore`]: tables behind one async mutex, used for `database.type: memory`
//!   and in tests
//! - [`postgres::PostgresStore`]: PostgreSQL via the repositories in [`crate::db::handlers`]

use crate::{
    db::{
        errors::Result,
        models::{
            bills::{Bill, BillCreateDBRequest, BillFilter, BillUpdateDBRequest},
            meter_readings::{MeterReading, MeterReadingUpsertDBRequest},
            rooms::{Room, RoomCreateDBRequest, RoomUpdateDBRequest},
            tenants::{Tenant, TenantCreateDBRequest, TenantUpdateDBRequest},
        },
    },
    types::{BillId, RoomId, TenantId},
};
use async_trait::async_trait;

pub mod in_memory;
pub mod postgres;

#[cfg(test)]
mod tests;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// A store that can open transactions.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>>;
}

/// One open transaction over rooms, tenants, bills and the meter feed.
#[async_trait]
pub trait StoreTx: Send {
    /// Get a room by ID, locking it
    async fn room(&mut self, id: RoomId) -> Result<Option<Room>>;

    /// Get a room by its room number, locking it
    async fn room_by_number(&mut self, room_number: &str) -> Result<Option<Room>>;

    /// All rooms ordered by room number
    async fn rooms(&mut self) -> Result<Vec<Room>>;

    async fn create_room(&mut self, request: &RoomCreateDBRequest) -> Result<Room>;

    async fn update_room(&mut self, id: RoomId, request: &RoomUpdateDBRequest) -> Result<Room>;

    /// Set or clear the room's tenant reference
    async fn set_room_tenant(&mut self, id: RoomId, tenant_id: Option<TenantId>) -> Result<Room>;

    async fn delete_room(&mut self, id: RoomId) -> Result<bool>;

    /// Get a tenant by ID, locking it
    async fn tenant(&mut self, id: TenantId) -> Result<Option<Tenant>>;

    /// All tenants registered under a citizen ID, locking them. More than one match means the
    /// natural key is ambiguous.
    async fn tenants_by_citizen_id(&mut self, citizen_id: &str) -> Result<Vec<Tenant>>;

    /// All tenants in creation order
    async fn tenants(&mut self) -> Result<Vec<Tenant>>;

    async fn create_tenant(&mut self, request: &TenantCreateDBRequest) -> Result<Tenant>;

    async fn update_tenant(&mut self, id: TenantId, request: &TenantUpdateDBRequest) -> Result<Tenant>;

    /// Set or clear the tenant's room reference
    async fn set_tenant_room(&mut self, id: TenantId, room_id: Option<RoomId>) -> Result<Tenant>;

    async fn delete_tenant(&mut self, id: TenantId) -> Result<bool>;

    async fn bill(&mut self, id: BillId) -> Result<Option<Bill>>;

    async fn bills(&mut self, filter: &BillFilter) -> Result<Vec<Bill>>;

    async fn create_bill(&mut self, request: &BillCreateDBRequest) -> Result<Bill>;

    async fn update_bill(&mut self, id: BillId, request: &BillUpdateDBRequest) -> Result<Bill>;

    async fn delete_bill(&mut self, id: BillId) -> Result<bool>;

    /// The meter feed, ordered by room number
    async fn meter_readings(&mut self) -> Result<Vec<MeterReading>>;

    async fn upsert_meter_reading(&mut self, request: &MeterReadingUpsertDBRequest) -> Result<MeterReading>;

    /// Make every write of this transaction visible at once
    async fn commit(self: Box<Self>) -> Result<()>;
}
