//! Room occupancy: tenant move-in, transfer, move-out, and room lifecycle.
//!
//! A room and its tenant reference each other (`Room::tenant_id` and `Tenant::room_id`). Every
//! operation here that touches either side runs inside one store transaction, so after any
//! completed operation the two references agree: a room points at a tenant exactly when that
//! tenant points back at the room.
//!
//! Tenants are identified by their UUID internally. The citizen ID is a lookup key used by
//! move-out and payment confirmation; a lookup that matches more than one tenant is rejected
//! rather than guessed.

use crate::{
    billing::charges::{MAX_AMOUNT, MAX_FIXTURES, Rates, amount_in_range, total_cost},
    db::models::{
        rooms::{Room, RoomCreateDBRequest, RoomUpdateDBRequest},
        tenants::{Tenant, TenantCreateDBRequest, TenantUpdateDBRequest},
    },
    errors::{Error, Result},
    store::Store,
    types::{RoomId, TenantId, abbrev_uuid},
};
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument, warn};

/// Tenant details supplied at move-in. Everything is optional here so that missing fields are
/// reported as invalid input rather than as a decoding failure.
#[derive(Debug, Clone, Default)]
pub struct NewTenant {
    pub room_id: Option<RoomId>,
    pub name: Option<String>,
    pub citizen_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    pub move_in_date: Option<String>,
}

/// Changes to an existing tenancy. A `room_id` different from the current room transfers the
/// tenant.
#[derive(Debug, Clone, Default)]
pub struct TenantChanges {
    pub room_id: Option<RoomId>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub move_in_date: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewRoom {
    pub room_number: Option<String>,
    pub floor: Option<i32>,
    pub price: Option<Decimal>,
    /// Defaults to 1
    pub bathroom_count: Option<i32>,
    /// Defaults to 1
    pub shower_count: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct RoomChanges {
    pub room_number: Option<String>,
    pub floor: Option<i32>,
    pub price: Option<Decimal>,
    pub bathroom_count: Option<i32>,
    pub shower_count: Option<i32>,
}

/// A room together with its occupant
#[derive(Debug, Clone)]
pub struct RoomView {
    pub room: Room,
    pub tenant: Option<Tenant>,
}

/// A tenant together with the room they occupy
#[derive(Debug, Clone)]
pub struct TenantView {
    pub tenant: Tenant,
    pub room: Option<Room>,
}

/// What a consistency sweep repaired
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ReconcileReport {
    /// Rooms whose tenant reference was cleared
    #[schema(value_type = Vec<String>)]
    pub vacated_rooms: Vec<RoomId>,
    /// Tenants whose room reference was cleared
    #[schema(value_type = Vec<String>)]
    pub detached_tenants: Vec<TenantId>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.vacated_rooms.is_empty() && self.detached_tenants.is_empty()
    }
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::invalid_input(format!("{field} is required"))),
    }
}

/// Reject a field that was supplied but blank
fn non_blank(field: &str, value: Option<String>) -> Result<Option<String>> {
    value.map(|v| required(field, Some(v))).transpose()
}

/// Parse a move-in date given as `YYYY-MM-DD` or as an RFC 3339 timestamp
pub fn parse_move_in_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| Error::invalid_input(format!("Invalid move-in date '{value}', expected YYYY-MM-DD")))
}

/// Blank means no email; anything else must be a valid address
fn parse_email(value: Option<String>) -> Result<Option<String>> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => v
            .parse::<lettre::Address>()
            .map(|address| Some(address.to_string()))
            .map_err(|_| Error::invalid_input(format!("Invalid email address '{v}'"))),
        None => Ok(None),
    }
}

fn validate_room_fields(floor: Option<i32>, price: Option<Decimal>, bathrooms: Option<i32>, showers: Option<i32>) -> Result<()> {
    if floor.is_some_and(|f| f < 1) {
        return Err(Error::invalid_input("floor must be at least 1"));
    }
    if price.is_some_and(|p| !amount_in_range(p)) {
        return Err(Error::invalid_input(format!("price must be between 0 and {MAX_AMOUNT}")));
    }
    if bathrooms.is_some_and(|c| !(1..=MAX_FIXTURES).contains(&c)) {
        return Err(Error::invalid_input(format!("bathroom_count must be between 1 and {MAX_FIXTURES}")));
    }
    if showers.is_some_and(|c| !(1..=MAX_FIXTURES).contains(&c)) {
        return Err(Error::invalid_input(format!("shower_count must be between 1 and {MAX_FIXTURES}")));
    }
    Ok(())
}

/// Resolve a citizen ID lookup to exactly one tenant
pub(crate) fn single_tenant(mut matches: Vec<Tenant>, citizen_id: &str) -> Result<Tenant> {
    match matches.len() {
        0 => Err(Error::not_found("Tenant with citizen ID", citizen_id)),
        1 => Ok(matches.remove(0)),
        n => Err(Error::conflict(format!(
            "Citizen ID {citizen_id} matches {n} tenants, refusing to pick one"
        ))),
    }
}

/// Sort key putting room numbers in numeric order ("2" before "10"), non-numeric ones last
pub(crate) fn room_number_order(room_number: &str) -> (bool, i64, String) {
    match room_number.trim().parse::<i64>() {
        Ok(n) => (false, n, room_number.to_string()),
        Err(_) => (true, 0, room_number.to_string()),
    }
}

/// Rooms paired with their tenant, where both references agree. Ordered by room number.
pub(crate) fn occupied_pairs(rooms: Vec<Room>, tenants: Vec<Tenant>) -> Vec<(Room, Tenant)> {
    let mut tenants: HashMap<TenantId, Tenant> = tenants.into_iter().map(|t| (t.id, t)).collect();

    let mut pairs: Vec<(Room, Tenant)> = rooms
        .into_iter()
        .filter_map(|room| {
            let tenant_id = room.tenant_id?;
            match tenants.remove(&tenant_id) {
                Some(tenant) if tenant.room_id == Some(room.id) => Some((room, tenant)),
                _ => None,
            }
        })
        .collect();

    pairs.sort_by_key(|(room, _)| room_number_order(&room.room_number));
    pairs
}

/// Performs occupancy transitions against a store
#[derive(Clone)]
pub struct OccupancyManager {
    store: Arc<dyn Store>,
    rates: Rates,
}

impl OccupancyManager {
    pub fn new(store: Arc<dyn Store>, rates: Rates) -> Self {
        Self { store, rates }
    }

    /// Move a new tenant into a vacant room
    #[instrument(skip_all, fields(room_id = ?input.room_id.as_ref().map(abbrev_uuid)), err)]
    pub async fn assign_tenant(&self, input: NewTenant) -> Result<TenantView> {
        let room_id = input.room_id.ok_or_else(|| Error::invalid_input("room_id is required"))?;
        let name = required("name", input.name)?;
        let citizen_id = required("citizen_id", input.citizen_id)?;
        let phone = required("phone", input.phone)?;
        let move_in_date = parse_move_in_date(&required("move_in_date", input.move_in_date)?)?;
        let email = parse_email(input.email)?;

        let mut tx = self.store.begin().await?;

        let room = tx.room(room_id).await?.ok_or_else(|| Error::not_found("Room", room_id))?;
        if !room.is_vacant() {
            return Err(Error::conflict(format!("Room {} is already occupied", room.room_number)));
        }
        if !tx.tenants_by_citizen_id(&citizen_id).await?.is_empty() {
            return Err(Error::conflict(format!("A tenant with citizen ID {citizen_id} already exists")));
        }

        let tenant = tx
            .create_tenant(&TenantCreateDBRequest {
                citizen_id,
                name,
                phone,
                email,
                move_in_date,
                room_id,
            })
            .await?;
        let room = tx.set_room_tenant(room_id, Some(tenant.id)).await?;
        tx.commit().await?;

        info!(
            tenant_id = %abbrev_uuid(&tenant.id),
            room_number = %room.room_number,
            "Tenant moved in"
        );
        Ok(TenantView {
            tenant,
            room: Some(room),
        })
    }

    /// Update a tenancy, transferring the tenant when a different room is given. The tenant's
    /// stored total is recomputed against the room they end up in.
    #[instrument(skip(self, changes), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn reassign_tenant(&self, tenant_id: TenantId, changes: TenantChanges) -> Result<TenantView> {
        let name = non_blank("name", changes.name)?;
        let phone = non_blank("phone", changes.phone)?;
        let move_in_date = changes
            .move_in_date
            .as_deref()
            .map(parse_move_in_date)
            .transpose()?;
        let email = parse_email(changes.email)?;

        let mut tx = self.store.begin().await?;

        let tenant = tx
            .tenant(tenant_id)
            .await?
            .ok_or_else(|| Error::not_found("Tenant", tenant_id))?;

        let room = match changes.room_id {
            Some(new_room_id) if Some(new_room_id) != tenant.room_id => {
                let new_room = tx
                    .room(new_room_id)
                    .await?
                    .ok_or_else(|| Error::not_found("Room", new_room_id))?;
                if !new_room.is_vacant() {
                    return Err(Error::conflict(format!("Room {} is already occupied", new_room.room_number)));
                }

                if let Some(old_room_id) = tenant.room_id
                    && let Some(old_room) = tx.room(old_room_id).await?
                    && old_room.tenant_id == Some(tenant.id)
                {
                    tx.set_room_tenant(old_room_id, None).await?;
                }
                tx.set_tenant_room(tenant.id, Some(new_room_id)).await?;
                let new_room = tx.set_room_tenant(new_room_id, Some(tenant.id)).await?;

                info!(
                    from = ?tenant.room_id.as_ref().map(abbrev_uuid),
                    to = %new_room.room_number,
                    "Tenant transferred"
                );
                Some(new_room)
            }
            _ => match tenant.room_id {
                Some(room_id) => tx.room(room_id).await?,
                None => None,
            },
        };

        let total = room
            .as_ref()
            .map(|room| total_cost(room, tenant.old_meter_reading, tenant.new_meter_reading, &self.rates));

        let tenant = tx
            .update_tenant(
                tenant.id,
                &TenantUpdateDBRequest {
                    name,
                    phone,
                    email,
                    move_in_date,
                    total_cost: total,
                    ..Default::default()
                },
            )
            .await?;
        tx.commit().await?;

        Ok(TenantView { tenant, room })
    }

    /// Move a tenant out: vacate their room and delete the tenant record
    #[instrument(skip(self), err)]
    pub async fn release_tenant(&self, citizen_id: &str) -> Result<()> {
        let mut tx = self.store.begin().await?;

        let tenant = single_tenant(tx.tenants_by_citizen_id(citizen_id).await?, citizen_id)?;

        if let Some(room_id) = tenant.room_id {
            match tx.room(room_id).await? {
                Some(room) if room.tenant_id == Some(tenant.id) => {
                    tx.set_room_tenant(room_id, None).await?;
                }
                Some(_) => warn!(
                    tenant_id = %abbrev_uuid(&tenant.id),
                    room_id = %abbrev_uuid(&room_id),
                    "Tenant's room does not point back at the tenant, leaving the room untouched"
                ),
                None => warn!(
                    tenant_id = %abbrev_uuid(&tenant.id),
                    room_id = %abbrev_uuid(&room_id),
                    "Tenant references a room that no longer exists"
                ),
            }
        }

        tx.delete_tenant(tenant.id).await?;
        tx.commit().await?;

        info!(tenant_id = %abbrev_uuid(&tenant.id), "Tenant moved out");
        Ok(())
    }

    #[instrument(skip_all, err)]
    pub async fn create_room(&self, input: NewRoom) -> Result<Room> {
        let room_number = required("room_number", input.room_number)?;
        let floor = input.floor.ok_or_else(|| Error::invalid_input("floor is required"))?;
        let price = input.price.ok_or_else(|| Error::invalid_input("price is required"))?;
        let bathroom_count = input.bathroom_count.unwrap_or(1);
        let shower_count = input.shower_count.unwrap_or(1);
        validate_room_fields(Some(floor), Some(price), Some(bathroom_count), Some(shower_count))?;

        let mut tx = self.store.begin().await?;
        if tx.room_by_number(&room_number).await?.is_some() {
            return Err(Error::conflict(format!("Room number {room_number} already exists")));
        }

        let room = tx
            .create_room(&RoomCreateDBRequest {
                room_number,
                floor,
                price,
                bathroom_count,
                shower_count,
            })
            .await?;
        tx.commit().await?;

        info!(room_id = %abbrev_uuid(&room.id), room_number = %room.room_number, "Room created");
        Ok(room)
    }

    /// Edit room attributes. If the room is occupied and its price or fixtures change, the
    /// occupant's stored total is recomputed in the same transaction.
    #[instrument(skip(self, changes), fields(room_id = %abbrev_uuid(&room_id)), err)]
    pub async fn update_room(&self, room_id: RoomId, changes: RoomChanges) -> Result<RoomView> {
        let room_number = non_blank("room_number", changes.room_number)?;
        validate_room_fields(changes.floor, changes.price, changes.bathroom_count, changes.shower_count)?;

        let mut tx = self.store.begin().await?;

        let room = tx.room(room_id).await?.ok_or_else(|| Error::not_found("Room", room_id))?;
        if let Some(number) = &room_number
            && *number != room.room_number
            && tx.room_by_number(number).await?.is_some()
        {
            return Err(Error::conflict(format!("Room number {number} already exists")));
        }

        let request = RoomUpdateDBRequest {
            room_number,
            floor: changes.floor,
            price: changes.price,
            bathroom_count: changes.bathroom_count,
            shower_count: changes.shower_count,
        };
        let recharge = request.changes_charges(&room);
        let room = tx.update_room(room_id, &request).await?;

        let mut tenant = match room.tenant_id {
            Some(tenant_id) => tx.tenant(tenant_id).await?,
            None => None,
        };
        if recharge
            && let Some(occupant) = tenant.as_ref().filter(|t| t.room_id == Some(room.id))
        {
            let total = total_cost(&room, occupant.old_meter_reading, occupant.new_meter_reading, &self.rates);
            let update = TenantUpdateDBRequest {
                total_cost: Some(total),
                ..Default::default()
            };
            tenant = Some(tx.update_tenant(occupant.id, &update).await?);
        }
        tx.commit().await?;

        Ok(RoomView { room, tenant })
    }

    /// Delete a vacant room
    #[instrument(skip(self), fields(room_id = %abbrev_uuid(&room_id)), err)]
    pub async fn delete_room(&self, room_id: RoomId) -> Result<()> {
        let mut tx = self.store.begin().await?;

        let room = tx.room(room_id).await?.ok_or_else(|| Error::not_found("Room", room_id))?;
        if !room.is_vacant() {
            return Err(Error::conflict(format!(
                "Room {} is occupied, remove the tenant first",
                room.room_number
            )));
        }

        tx.delete_room(room_id).await?;
        tx.commit().await?;

        info!(room_number = %room.room_number, "Room deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(room_id = %abbrev_uuid(&room_id)), err)]
    pub async fn room(&self, room_id: RoomId) -> Result<RoomView> {
        let mut tx = self.store.begin().await?;
        let room = tx.room(room_id).await?.ok_or_else(|| Error::not_found("Room", room_id))?;
        let tenant = match room.tenant_id {
            Some(tenant_id) => tx.tenant(tenant_id).await?,
            None => None,
        };
        tx.commit().await?;

        Ok(RoomView { room, tenant })
    }

    /// All rooms with their occupants, optionally only occupied (`Some(true)`) or vacant rooms
    #[instrument(skip(self), err)]
    pub async fn rooms(&self, occupied: Option<bool>) -> Result<Vec<RoomView>> {
        let mut tx = self.store.begin().await?;
        let rooms = tx.rooms().await?;
        let tenants: HashMap<TenantId, Tenant> = tx.tenants().await?.into_iter().map(|t| (t.id, t)).collect();
        tx.commit().await?;

        let mut views: Vec<RoomView> = rooms
            .into_iter()
            .filter(|room| occupied.is_none_or(|occupied| occupied != room.is_vacant()))
            .map(|room| {
                let tenant = room.tenant_id.and_then(|id| tenants.get(&id).cloned());
                RoomView { room, tenant }
            })
            .collect();
        views.sort_by_key(|view| room_number_order(&view.room.room_number));
        Ok(views)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn tenant(&self, tenant_id: TenantId) -> Result<TenantView> {
        let mut tx = self.store.begin().await?;
        let tenant = tx
            .tenant(tenant_id)
            .await?
            .ok_or_else(|| Error::not_found("Tenant", tenant_id))?;
        let room = match tenant.room_id {
            Some(room_id) => tx.room(room_id).await?,
            None => None,
        };
        tx.commit().await?;

        Ok(TenantView { tenant, room })
    }

    #[instrument(skip(self), err)]
    pub async fn tenant_by_citizen_id(&self, citizen_id: &str) -> Result<TenantView> {
        let mut tx = self.store.begin().await?;
        let tenant = single_tenant(tx.tenants_by_citizen_id(citizen_id).await?, citizen_id)?;
        let room = match tenant.room_id {
            Some(room_id) => tx.room(room_id).await?,
            None => None,
        };
        tx.commit().await?;

        Ok(TenantView { tenant, room })
    }

    #[instrument(skip(self), err)]
    pub async fn tenants(&self) -> Result<Vec<TenantView>> {
        let mut tx = self.store.begin().await?;
        let tenants = tx.tenants().await?;
        let rooms: HashMap<RoomId, Room> = tx.rooms().await?.into_iter().map(|r| (r.id, r)).collect();
        tx.commit().await?;

        Ok(tenants
            .into_iter()
            .map(|tenant| {
                let room = tenant.room_id.and_then(|id| rooms.get(&id).cloned());
                TenantView { tenant, room }
            })
            .collect())
    }

    /// Repair any room/tenant pair whose references disagree.
    ///
    /// A room pointing at a missing tenant, or at a tenant that points elsewhere, is vacated. A
    /// tenant pointing at a missing room, or at a room that does not point back, is detached.
    /// Nothing is re-paired: a detached tenant has to be reassigned explicitly.
    #[instrument(skip(self), err)]
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut tx = self.store.begin().await?;
        let rooms = tx.rooms().await?;
        let tenants = tx.tenants().await?;

        let room_tenants: HashMap<RoomId, Option<TenantId>> = rooms.iter().map(|r| (r.id, r.tenant_id)).collect();
        let tenant_rooms: HashMap<TenantId, Option<RoomId>> = tenants.iter().map(|t| (t.id, t.room_id)).collect();

        let mut report = ReconcileReport::default();

        for room in &rooms {
            if let Some(tenant_id) = room.tenant_id
                && tenant_rooms.get(&tenant_id) != Some(&Some(room.id))
            {
                warn!(
                    room_number = %room.room_number,
                    tenant_id = %abbrev_uuid(&tenant_id),
                    "Room references a tenant that does not point back, vacating"
                );
                tx.set_room_tenant(room.id, None).await?;
                report.vacated_rooms.push(room.id);
            }
        }

        for tenant in &tenants {
            if let Some(room_id) = tenant.room_id
                && room_tenants.get(&room_id) != Some(&Some(tenant.id))
            {
                warn!(
                    tenant_id = %abbrev_uuid(&tenant.id),
                    room_id = %abbrev_uuid(&room_id),
                    "Tenant references a room that does not point back, detaching"
                );
                tx.set_tenant_room(tenant.id, None).await?;
                report.detached_tenants.push(tenant.id);
            }
        }

        tx.commit().await?;

        if !report.is_clean() {
            info!(
                vacated = report.vacated_rooms.len(),
                detached = report.detached_tenants.len(),
                "Occupancy references repaired"
            );
        }
        Ok(report)
    }
}
