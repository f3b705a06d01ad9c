//! In-process store backend.
//!
//! A transaction holds the table mutex for its whole lifetime and works on a private copy of the
//! tables. Commit swaps the copy in; dropping the transaction throws it away. Transactions are
//! therefore fully serialized, which is plenty for a single-process deployment and for tests.
//!
//! The same constraints the PostgreSQL schema declares are enforced here (unique room numbers,
//! citizen IDs and room tenant references, foreign keys with `ON DELETE SET NULL` / `CASCADE`), so
//! callers observe the same errors from both backends.

use super::{Store, StoreTx};
use crate::{
    db::{
        errors::{DbError, Result},
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
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct Tables {
    rooms: Vec<Room>,
    tenants: Vec<Tenant>,
    bills: Vec<Bill>,
    meter_readings: Vec<MeterReading>,
}

impl Tables {
    fn room_mut(&mut self, id: RoomId) -> Result<&mut Room> {
        self.rooms.iter_mut().find(|r| r.id == id).ok_or(DbError::NotFound)
    }

    fn tenant_mut(&mut self, id: TenantId) -> Result<&mut Tenant> {
        self.tenants.iter_mut().find(|t| t.id == id).ok_or(DbError::NotFound)
    }

    fn bill_mut(&mut self, id: BillId) -> Result<&mut Bill> {
        self.bills.iter_mut().find(|b| b.id == id).ok_or(DbError::NotFound)
    }

    fn ensure_room_number_free(&self, room_number: &str, except: Option<RoomId>) -> Result<()> {
        if self
            .rooms
            .iter()
            .any(|r| r.room_number == room_number && Some(r.id) != except)
        {
            return Err(DbError::unique_violation("rooms", "rooms_room_number_unique", room_number));
        }
        Ok(())
    }
}

fn foreign_key_violation(table: &str, constraint: &str) -> DbError {
    DbError::ForeignKeyViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("insert or update on table \"{table}\" violates foreign key constraint \"{constraint}\""),
    }
}

/// In-memory store
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTx { guard, working }))
    }
}

/// An open in-memory transaction. Dropping it without [`StoreTx::commit`] rolls back.
pub struct InMemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn room(&mut self, id: RoomId) -> Result<Option<Room>> {
        Ok(self.working.rooms.iter().find(|r| r.id == id).cloned())
    }

    async fn room_by_number(&mut self, room_number: &str) -> Result<Option<Room>> {
        Ok(self.working.rooms.iter().find(|r| r.room_number == room_number).cloned())
    }

    async fn rooms(&mut self) -> Result<Vec<Room>> {
        let mut rooms = self.working.rooms.clone();
        rooms.sort_by(|a, b| a.room_number.cmp(&b.room_number));
        Ok(rooms)
    }

    async fn create_room(&mut self, request: &RoomCreateDBRequest) -> Result<Room> {
        self.working.ensure_room_number_free(&request.room_number, None)?;

        let now = Utc::now();
        let room = Room {
            id: Uuid::new_v4(),
            room_number: request.room_number.clone(),
            floor: request.floor,
            price: request.price,
            bathroom_count: request.bathroom_count,
            shower_count: request.shower_count,
            tenant_id: None,
            created_at: now,
            updated_at: now,
        };
        self.working.rooms.push(room.clone());
        Ok(room)
    }

    async fn update_room(&mut self, id: RoomId, request: &RoomUpdateDBRequest) -> Result<Room> {
        if let Some(room_number) = &request.room_number {
            self.working.ensure_room_number_free(room_number, Some(id))?;
        }

        let room = self.working.room_mut(id)?;
        if let Some(room_number) = &request.room_number {
            room.room_number = room_number.clone();
        }
        if let Some(floor) = request.floor {
            room.floor = floor;
        }
        if let Some(price) = request.price {
            room.price = price;
        }
        if let Some(bathroom_count) = request.bathroom_count {
            room.bathroom_count = bathroom_count;
        }
        if let Some(shower_count) = request.shower_count {
            room.shower_count = shower_count;
        }
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn set_room_tenant(&mut self, id: RoomId, tenant_id: Option<TenantId>) -> Result<Room> {
        if let Some(tenant_id) = tenant_id {
            if !self.working.tenants.iter().any(|t| t.id == tenant_id) {
                return Err(foreign_key_violation("rooms", "rooms_tenant_id_fkey"));
            }
            if self
                .working
                .rooms
                .iter()
                .any(|r| r.id != id && r.tenant_id == Some(tenant_id))
            {
                return Err(DbError::unique_violation(
                    "rooms",
                    "rooms_tenant_id_unique",
                    &tenant_id.to_string(),
                ));
            }
        }

        let room = self.working.room_mut(id)?;
        room.tenant_id = tenant_id;
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn delete_room(&mut self, id: RoomId) -> Result<bool> {
        let before = self.working.rooms.len();
        self.working.rooms.retain(|r| r.id != id);
        if self.working.rooms.len() == before {
            return Ok(false);
        }

        for tenant in self.working.tenants.iter_mut().filter(|t| t.room_id == Some(id)) {
            tenant.room_id = None;
        }
        self.working.bills.retain(|b| b.room_id != id);
        Ok(true)
    }

    async fn tenant(&mut self, id: TenantId) -> Result<Option<Tenant>> {
        Ok(self.working.tenants.iter().find(|t| t.id == id).cloned())
    }

    async fn tenants_by_citizen_id(&mut self, citizen_id: &str) -> Result<Vec<Tenant>> {
        Ok(self
            .working
            .tenants
            .iter()
            .filter(|t| t.citizen_id == citizen_id)
            .cloned()
            .collect())
    }

    async fn tenants(&mut self) -> Result<Vec<Tenant>> {
        Ok(self.working.tenants.clone())
    }

    async fn create_tenant(&mut self, request: &TenantCreateDBRequest) -> Result<Tenant> {
        if self.working.tenants.iter().any(|t| t.citizen_id == request.citizen_id) {
            return Err(DbError::unique_violation(
                "tenants",
                "tenants_citizen_id_unique",
                &request.citizen_id,
            ));
        }
        if !self.working.rooms.iter().any(|r| r.id == request.room_id) {
            return Err(foreign_key_violation("tenants", "tenants_room_id_fkey"));
        }

        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            citizen_id: request.citizen_id.clone(),
            name: request.name.clone(),
            phone: request.phone.clone(),
            email: request.email.clone(),
            move_in_date: request.move_in_date,
            room_id: Some(request.room_id),
            old_meter_reading: 0,
            new_meter_reading: 0,
            total_cost: Decimal::ZERO,
            is_paid: false,
            billing_period: None,
            created_at: now,
            updated_at: now,
        };
        self.working.tenants.push(tenant.clone());
        Ok(tenant)
    }

    async fn update_tenant(&mut self, id: TenantId, request: &TenantUpdateDBRequest) -> Result<Tenant> {
        let tenant = self.working.tenant_mut(id)?;
        if let Some(name) = &request.name {
            tenant.name = name.clone();
        }
        if let Some(phone) = &request.phone {
            tenant.phone = phone.clone();
        }
        if let Some(email) = &request.email {
            tenant.email = Some(email.clone());
        }
        if let Some(move_in_date) = request.move_in_date {
            tenant.move_in_date = move_in_date;
        }
        if let Some(old) = request.old_meter_reading {
            tenant.old_meter_reading = old;
        }
        if let Some(new) = request.new_meter_reading {
            tenant.new_meter_reading = new;
        }
        if let Some(total_cost) = request.total_cost {
            tenant.total_cost = total_cost;
        }
        if let Some(is_paid) = request.is_paid {
            tenant.is_paid = is_paid;
        }
        if let Some(period) = &request.billing_period {
            tenant.billing_period = Some(period.clone());
        }
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }

    async fn set_tenant_room(&mut self, id: TenantId, room_id: Option<RoomId>) -> Result<Tenant> {
        if let Some(room_id) = room_id
            && !self.working.rooms.iter().any(|r| r.id == room_id)
        {
            return Err(foreign_key_violation("tenants", "tenants_room_id_fkey"));
        }

        let tenant = self.working.tenant_mut(id)?;
        tenant.room_id = room_id;
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }

    async fn delete_tenant(&mut self, id: TenantId) -> Result<bool> {
        let before = self.working.tenants.len();
        self.working.tenants.retain(|t| t.id != id);
        if self.working.tenants.len() == before {
            return Ok(false);
        }

        for room in self.working.rooms.iter_mut().filter(|r| r.tenant_id == Some(id)) {
            room.tenant_id = None;
        }
        self.working.bills.retain(|b| b.tenant_id != id);
        Ok(true)
    }

    async fn bill(&mut self, id: BillId) -> Result<Option<Bill>> {
        Ok(self.working.bills.iter().find(|b| b.id == id).cloned())
    }

    async fn bills(&mut self, filter: &BillFilter) -> Result<Vec<Bill>> {
        Ok(self
            .working
            .bills
            .iter()
            .rev()
            .filter(|b| filter.tenant_id.is_none_or(|id| b.tenant_id == id))
            .filter(|b| filter.room_id.is_none_or(|id| b.room_id == id))
            .cloned()
            .collect())
    }

    async fn create_bill(&mut self, request: &BillCreateDBRequest) -> Result<Bill> {
        if !self.working.rooms.iter().any(|r| r.id == request.room_id) {
            return Err(foreign_key_violation("bills", "bills_room_id_fkey"));
        }
        if !self.working.tenants.iter().any(|t| t.id == request.tenant_id) {
            return Err(foreign_key_violation("bills", "bills_tenant_id_fkey"));
        }

        let now = Utc::now();
        let bill = Bill {
            id: Uuid::new_v4(),
            room_id: request.room_id,
            tenant_id: request.tenant_id,
            electricity: request.electricity,
            water: request.water,
            room_price: request.room_price,
            total: request.total(),
            created_at: now,
            updated_at: now,
        };
        self.working.bills.push(bill.clone());
        Ok(bill)
    }

    async fn update_bill(&mut self, id: BillId, request: &BillUpdateDBRequest) -> Result<Bill> {
        let bill = self.working.bill_mut(id)?;
        if let Some(electricity) = request.electricity {
            bill.electricity = electricity;
        }
        if let Some(water) = request.water {
            bill.water = water;
        }
        if let Some(room_price) = request.room_price {
            bill.room_price = room_price;
        }
        bill.total = bill.electricity + bill.water + bill.room_price;
        bill.updated_at = Utc::now();
        Ok(bill.clone())
    }

    async fn delete_bill(&mut self, id: BillId) -> Result<bool> {
        let before = self.working.bills.len();
        self.working.bills.retain(|b| b.id != id);
        Ok(self.working.bills.len() != before)
    }

    async fn meter_readings(&mut self) -> Result<Vec<MeterReading>> {
        let mut readings = self.working.meter_readings.clone();
        readings.sort_by(|a, b| a.room_number.cmp(&b.room_number));
        Ok(readings)
    }

    async fn upsert_meter_reading(&mut self, request: &MeterReadingUpsertDBRequest) -> Result<MeterReading> {
        let reading = MeterReading {
            room_number: request.room_number.clone(),
            old_reading: request.old_reading,
            new_reading: request.new_reading,
            recorded_at: Utc::now(),
        };

        match self
            .working
            .meter_readings
            .iter_mut()
            .find(|r| r.room_number == request.room_number)
        {
            Some(existing) => *existing = reading.clone(),
            None => self.working.meter_readings.push(reading.clone()),
        }
        Ok(reading)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn room_request(number: &str) -> RoomCreateDBRequest {
        RoomCreateDBRequest {
            room_number: number.to_string(),
            floor: 1,
            price: Decimal::new(3_000_000, 0),
            bathroom_count: 1,
            shower_count: 1,
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = InMemoryStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.create_room(&room_request("101")).await.unwrap();
            // dropped without commit
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.rooms().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let room = tx.create_room(&room_request("101")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.room(room.id).await.unwrap(), Some(room));
    }

    #[tokio::test]
    async fn test_deleting_tenant_clears_room_reference() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        let room = tx.create_room(&room_request("101")).await.unwrap();
        let tenant = tx
            .create_tenant(&TenantCreateDBRequest {
                citizen_id: "001".to_string(),
                name: "Lan".to_string(),
                phone: "0900".to_string(),
                email: None,
                move_in_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                room_id: room.id,
            })
            .await
            .unwrap();
        tx.set_room_tenant(room.id, Some(tenant.id)).await.unwrap();

        assert!(tx.delete_tenant(tenant.id).await.unwrap());
        let room = tx.room(room.id).await.unwrap().unwrap();
        assert!(room.is_vacant());
    }
}
