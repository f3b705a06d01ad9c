//! PostgreSQL store backend.
//!
//! Each store transaction is a database transaction. Single-record reads use
//! `SELECT ... FOR UPDATE`, so concurrent transitions on the same room or tenant serialize on the
//! row lock and the loser re-checks its precondition against the winner's committed state.

use super::{Store, StoreTx};
use crate::{
    db::{
        errors::Result,
        handlers::{
            Bills, MeterReadings, Repository, Rooms, Tenants,
            rooms::RoomFilter,
            tenants::TenantFilter,
        },
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
use sqlx::{PgPool, Postgres, Transaction};

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTx { tx }))
    }
}

/// An open database transaction. Dropping it without [`StoreTx::commit`] rolls back.
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn room(&mut self, id: RoomId) -> Result<Option<Room>> {
        Rooms::new(&mut *self.tx).get_for_update(id).await
    }

    async fn room_by_number(&mut self, room_number: &str) -> Result<Option<Room>> {
        Rooms::new(&mut *self.tx).get_by_number(room_number).await
    }

    async fn rooms(&mut self) -> Result<Vec<Room>> {
        Rooms::new(&mut *self.tx).list(&RoomFilter::default()).await
    }

    async fn create_room(&mut self, request: &RoomCreateDBRequest) -> Result<Room> {
        Rooms::new(&mut *self.tx).create(request).await
    }

    async fn update_room(&mut self, id: RoomId, request: &RoomUpdateDBRequest) -> Result<Room> {
        Rooms::new(&mut *self.tx).update(id, request).await
    }

    async fn set_room_tenant(&mut self, id: RoomId, tenant_id: Option<TenantId>) -> Result<Room> {
        Rooms::new(&mut *self.tx).set_tenant(id, tenant_id).await
    }

    async fn delete_room(&mut self, id: RoomId) -> Result<bool> {
        Rooms::new(&mut *self.tx).delete(id).await
    }

    async fn tenant(&mut self, id: TenantId) -> Result<Option<Tenant>> {
        Tenants::new(&mut *self.tx).get_for_update(id).await
    }

    async fn tenants_by_citizen_id(&mut self, citizen_id: &str) -> Result<Vec<Tenant>> {
        Tenants::new(&mut *self.tx).list(&TenantFilter::by_citizen_id(citizen_id)).await
    }

    async fn tenants(&mut self) -> Result<Vec<Tenant>> {
        Tenants::new(&mut *self.tx).list(&TenantFilter::default()).await
    }

    async fn create_tenant(&mut self, request: &TenantCreateDBRequest) -> Result<Tenant> {
        Tenants::new(&mut *self.tx).create(request).await
    }

    async fn update_tenant(&mut self, id: TenantId, request: &TenantUpdateDBRequest) -> Result<Tenant> {
        Tenants::new(&mut *self.tx).update(id, request).await
    }

    async fn set_tenant_room(&mut self, id: TenantId, room_id: Option<RoomId>) -> Result<Tenant> {
        Tenants::new(&mut *self.tx).set_room(id, room_id).await
    }

    async fn delete_tenant(&mut self, id: TenantId) -> Result<bool> {
        Tenants::new(&mut *self.tx).delete(id).await
    }

    async fn bill(&mut self, id: BillId) -> Result<Option<Bill>> {
        Bills::new(&mut *self.tx).get_by_id(id).await
    }

    async fn bills(&mut self, filter: &BillFilter) -> Result<Vec<Bill>> {
        Bills::new(&mut *self.tx).list(filter).await
    }

    async fn create_bill(&mut self, request: &BillCreateDBRequest) -> Result<Bill> {
        Bills::new(&mut *self.tx).create(request).await
    }

    async fn update_bill(&mut self, id: BillId, request: &BillUpdateDBRequest) -> Result<Bill> {
        Bills::new(&mut *self.tx).update(id, request).await
    }

    async fn delete_bill(&mut self, id: BillId) -> Result<bool> {
        Bills::new(&mut *self.tx).delete(id).await
    }

    async fn meter_readings(&mut self) -> Result<Vec<MeterReading>> {
        MeterReadings::new(&mut *self.tx).list().await
    }

    async fn upsert_meter_reading(&mut self, request: &MeterReadingUpsertDBRequest) -> Result<MeterReading> {
        MeterReadings::new(&mut *self.tx).upsert(request).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
