//! Monthly utility billing.
//!
//! A tenancy's monthly charge is the room price, a flat water charge per bathroom and shower,
//! and the electricity consumed since the tenant's baseline meter reading. Mutations that change
//! any input (new meter readings, billing runs, room edits) store the recomputed total on the
//! tenant. Read paths work from the meter feed and report the stored total whenever one exists.
//!
//! The period lifecycle per tenancy is `unbilled -> billed -> paid | unpaid`, and
//! [`BillingCalculator::reset_billing_period`] returns every tenancy to unbilled for the next
//! month, rolling the meter baseline forward.

pub mod bills;
pub mod charges;
pub mod period;

use crate::{
    config::BillingConfig,
    db::models::{
        bills::{Bill, BillCreateDBRequest},
        meter_readings::{MeterReading, MeterReadingUpsertDBRequest},
        rooms::Room,
        tenants::{Tenant, TenantUpdateDBRequest},
    },
    errors::{Error, Result},
    export::ExportRow,
    meters::MeterReadingSource,
    occupancy::{occupied_pairs, single_tenant},
    store::Store,
    types::{RoomId, TenantId, abbrev_uuid},
};
use charges::{ChargeBreakdown, MAX_METER_READING, Rates};
use chrono::{Datelike, NaiveDate};
use period::BillingPeriod;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

/// The current charges of one occupied room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Statement {
    #[schema(value_type = String, format = "uuid")]
    pub room_id: RoomId,
    pub room_number: String,
    pub floor: i32,
    #[schema(value_type = String, format = "uuid")]
    pub tenant_id: TenantId,
    pub tenant_name: String,
    pub citizen_id: String,
    pub email: Option<String>,
    pub old_meter_reading: i64,
    pub new_meter_reading: i64,
    /// Charges computed from the room and the readings above
    pub charges: ChargeBreakdown,
    /// Total stored on the tenant (zero until the period is billed)
    #[schema(value_type = String)]
    pub billed_total: Decimal,
    /// The stored total once billed, the computed one before
    #[schema(value_type = String)]
    pub amount_due: Decimal,
    pub is_paid: bool,
    pub billing_period: Option<String>,
}

impl Statement {
    /// Charges from the readings stored on the tenant
    pub fn new(room: &Room, tenant: &Tenant, rates: &Rates) -> Self {
        let charges = ChargeBreakdown::compute(room, tenant.old_meter_reading, tenant.new_meter_reading, rates);
        Self::with_charges(room, tenant, (tenant.old_meter_reading, tenant.new_meter_reading), charges)
    }

    /// Charges from the room's meter feed record. Without one the tenant's stored readings are
    /// shown and no electricity is charged.
    pub fn from_feed(room: &Room, tenant: &Tenant, reading: Option<&MeterReading>, rates: &Rates) -> Self {
        match reading {
            Some(r) => Self::with_charges(
                room,
                tenant,
                (r.old_reading, r.new_reading),
                ChargeBreakdown::compute(room, r.old_reading, r.new_reading, rates),
            ),
            None => Self::with_charges(
                room,
                tenant,
                (tenant.old_meter_reading, tenant.new_meter_reading),
                ChargeBreakdown::without_electricity(room, rates),
            ),
        }
    }

    fn with_charges(room: &Room, tenant: &Tenant, (old, new): (i64, i64), charges: ChargeBreakdown) -> Self {
        let amount_due = if tenant.total_cost.is_zero() {
            charges.total
        } else {
            tenant.total_cost
        };
        Self {
            room_id: room.id,
            room_number: room.room_number.clone(),
            floor: room.floor,
            tenant_id: tenant.id,
            tenant_name: tenant.name.clone(),
            citizen_id: tenant.citizen_id.clone(),
            email: tenant.email.clone(),
            old_meter_reading: old,
            new_meter_reading: new,
            charges,
            billed_total: tenant.total_cost,
            amount_due,
            is_paid: tenant.is_paid,
            billing_period: tenant.billing_period.clone(),
        }
    }
}

/// Feed records keyed by room number
fn readings_by_room(readings: &[MeterReading]) -> HashMap<&str, &MeterReading> {
    readings.iter().map(|r| (r.room_number.as_str(), r)).collect()
}

/// Result of a month-end rollover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResetOutcome {
    pub period: String,
    /// Tenancies rolled into the period by this call
    pub rolled: usize,
    /// Tenancies that had already been rolled into the period
    pub skipped: usize,
}

/// Revenue collected from paid tenancies, by component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RevenueBreakdown {
    #[schema(value_type = String)]
    pub room: Decimal,
    #[schema(value_type = String)]
    pub electricity: Decimal,
    #[schema(value_type = String)]
    pub water: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
}

/// Dashboard figures, computed on request from the current records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BillingSummary {
    pub total_rooms: usize,
    pub occupied_rooms: usize,
    pub vacant_rooms: usize,
    pub tenants: usize,
    pub paid: usize,
    pub unpaid: usize,
    pub revenue: RevenueBreakdown,
    /// Sum of amounts due from unpaid tenancies
    #[schema(value_type = String)]
    pub outstanding: Decimal,
}

/// Computes and records charges against a store
#[derive(Clone)]
pub struct BillingCalculator {
    store: Arc<dyn Store>,
    config: BillingConfig,
}

impl BillingCalculator {
    pub fn new(store: Arc<dyn Store>, config: BillingConfig) -> Self {
        Self { store, config }
    }

    pub fn rates(&self) -> Rates {
        self.config.rates()
    }

    /// Record a tenant's latest meter reading, store the resulting total and mirror the reading
    /// into the room's feed record
    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn record_meter_reading(&self, tenant_id: TenantId, new_reading: i64) -> Result<Statement> {
        if !(0..=MAX_METER_READING).contains(&new_reading) {
            return Err(Error::invalid_input(format!(
                "Meter reading must be between 0 and {MAX_METER_READING}"
            )));
        }

        let mut tx = self.store.begin().await?;
        let tenant = tx
            .tenant(tenant_id)
            .await?
            .ok_or_else(|| Error::not_found("Tenant", tenant_id))?;
        let room = match tenant.room_id {
            Some(room_id) => tx.room(room_id).await?,
            None => None,
        }
        .ok_or_else(|| Error::conflict("Tenant has no room to bill"))?;

        let charges = ChargeBreakdown::compute(&room, tenant.old_meter_reading, new_reading, &self.rates());
        let tenant = tx
            .update_tenant(
                tenant.id,
                &TenantUpdateDBRequest {
                    new_meter_reading: Some(new_reading),
                    total_cost: Some(charges.total),
                    ..Default::default()
                },
            )
            .await?;
        tx.upsert_meter_reading(&MeterReadingUpsertDBRequest {
            room_number: room.room_number.clone(),
            old_reading: tenant.old_meter_reading,
            new_reading,
        })
        .await?;
        tx.commit().await?;

        debug!(room_number = %room.room_number, total = %charges.total, "Meter reading recorded");
        Ok(Statement::new(&room, &tenant, &self.rates()))
    }

    /// Billing run: copy the meter feed onto every occupied tenancy and store the totals.
    ///
    /// A room missing from the feed keeps the readings it has and is charged no electricity.
    #[instrument(skip_all, err)]
    pub async fn apply_meter_readings(&self, source: &dyn MeterReadingSource) -> Result<Vec<Statement>> {
        let readings = source.readings().await?;
        let by_room = readings_by_room(&readings);

        let rates = self.rates();
        let mut tx = self.store.begin().await?;
        let pairs = occupied_pairs(tx.rooms().await?, tx.tenants().await?);

        let mut statements = Vec::with_capacity(pairs.len());
        for (room, tenant) in pairs {
            let reading = by_room.get(room.room_number.as_str()).copied();
            let update = match reading {
                Some(r) => TenantUpdateDBRequest {
                    old_meter_reading: Some(r.old_reading),
                    new_meter_reading: Some(r.new_reading),
                    total_cost: Some(ChargeBreakdown::compute(&room, r.old_reading, r.new_reading, &rates).total),
                    ..Default::default()
                },
                None => TenantUpdateDBRequest {
                    total_cost: Some(ChargeBreakdown::without_electricity(&room, &rates).total),
                    ..Default::default()
                },
            };

            let tenant = tx.update_tenant(tenant.id, &update).await?;
            statements.push(Statement::from_feed(&room, &tenant, reading, &rates));
        }
        tx.commit().await?;

        info!(rooms = statements.len(), feed_records = readings.len(), "Meter readings applied");
        Ok(statements)
    }

    /// Current charges for every occupied room from the meter feed, ordered by room number
    #[instrument(skip_all, err)]
    pub async fn statements(&self, source: &dyn MeterReadingSource) -> Result<Vec<Statement>> {
        let readings = source.readings().await?;
        let by_room = readings_by_room(&readings);

        let mut tx = self.store.begin().await?;
        let pairs = occupied_pairs(tx.rooms().await?, tx.tenants().await?);
        tx.commit().await?;

        let rates = self.rates();
        Ok(pairs
            .iter()
            .map(|(room, tenant)| {
                let reading = by_room.get(room.room_number.as_str()).copied();
                Statement::from_feed(room, tenant, reading, &rates)
            })
            .collect())
    }

    /// Mark a tenant's current period as paid. Confirming an already paid tenant changes nothing.
    #[instrument(skip(self), err)]
    pub async fn confirm_payment(&self, citizen_id: &str) -> Result<Tenant> {
        let mut tx = self.store.begin().await?;
        let tenant = single_tenant(tx.tenants_by_citizen_id(citizen_id).await?, citizen_id)?;

        if tenant.is_paid {
            debug!(tenant_id = %abbrev_uuid(&tenant.id), "Payment already confirmed");
            return Ok(tenant);
        }

        let tenant = tx
            .update_tenant(
                tenant.id,
                &TenantUpdateDBRequest {
                    is_paid: Some(true),
                    ..Default::default()
                },
            )
            .await?;
        tx.commit().await?;

        info!(tenant_id = %abbrev_uuid(&tenant.id), "Payment confirmed");
        Ok(tenant)
    }

    /// Month-end rollover into `period`: for every occupied tenancy not yet rolled into it, the
    /// baseline becomes the latest reading, the stored total goes to zero and the payment flag is
    /// cleared. The room's feed record, if any, rolls its baseline too. All tenancies roll together
    /// or none do, and repeating the call for the same period rolls nothing twice.
    #[instrument(skip(self), fields(period = %period), err)]
    pub async fn reset_billing_period(&self, period: BillingPeriod) -> Result<ResetOutcome> {
        let label = period.to_string();
        let mut tx = self.store.begin().await?;
        let pairs = occupied_pairs(tx.rooms().await?, tx.tenants().await?);

        let mut outcome = ResetOutcome {
            period: label.clone(),
            rolled: 0,
            skipped: 0,
        };
        let feed: HashMap<String, MeterReading> = tx
            .meter_readings()
            .await?
            .into_iter()
            .map(|r| (r.room_number.clone(), r))
            .collect();

        for (room, listed) in pairs {
            // re-read under lock so a concurrent rollover of the same period is seen
            let Some(tenant) = tx.tenant(listed.id).await? else {
                continue;
            };
            if tenant.billing_period.as_deref() == Some(label.as_str()) {
                outcome.skipped += 1;
                continue;
            }

            tx.update_tenant(
                tenant.id,
                &TenantUpdateDBRequest {
                    old_meter_reading: Some(tenant.new_meter_reading),
                    total_cost: Some(Decimal::ZERO),
                    is_paid: Some(false),
                    billing_period: Some(label.clone()),
                    ..Default::default()
                },
            )
            .await?;
            if let Some(reading) = feed.get(&room.room_number) {
                tx.upsert_meter_reading(&MeterReadingUpsertDBRequest {
                    room_number: reading.room_number.clone(),
                    old_reading: reading.new_reading,
                    new_reading: reading.new_reading,
                })
                .await?;
            }
            outcome.rolled += 1;
        }
        tx.commit().await?;

        info!(rolled = outcome.rolled, skipped = outcome.skipped, "Billing period reset");
        Ok(outcome)
    }

    /// Unpaid occupied tenancies, reported only once the month is past the alert day
    #[instrument(skip(self, source), err)]
    pub async fn unpaid(&self, as_of: NaiveDate, source: &dyn MeterReadingSource) -> Result<Vec<Statement>> {
        if as_of.day() <= self.config.unpaid_alert_after_day {
            return Ok(Vec::new());
        }

        Ok(self.statements(source).await?.into_iter().filter(|s| !s.is_paid).collect())
    }

    /// Dashboard figures from the store and the meter feed. Revenue components come from the
    /// computed charges; totals use each tenancy's amount due.
    #[instrument(skip_all, err)]
    pub async fn summary(&self, source: &dyn MeterReadingSource) -> Result<BillingSummary> {
        let readings = source.readings().await?;
        let by_room = readings_by_room(&readings);

        let mut tx = self.store.begin().await?;
        let rooms = tx.rooms().await?;
        let tenants = tx.tenants().await?;
        tx.commit().await?;

        let total_rooms = rooms.len();
        let vacant_rooms = rooms.iter().filter(|r| r.is_vacant()).count();
        let tenant_count = tenants.len();
        let rates = self.rates();

        let mut summary = BillingSummary {
            total_rooms,
            occupied_rooms: total_rooms - vacant_rooms,
            vacant_rooms,
            tenants: tenant_count,
            paid: 0,
            unpaid: 0,
            revenue: RevenueBreakdown::default(),
            outstanding: Decimal::ZERO,
        };

        for (room, tenant) in occupied_pairs(rooms, tenants) {
            let reading = by_room.get(room.room_number.as_str()).copied();
            let statement = Statement::from_feed(&room, &tenant, reading, &rates);
            if statement.is_paid {
                summary.paid += 1;
                summary.revenue.room += statement.charges.room_price;
                summary.revenue.electricity += statement.charges.electricity;
                summary.revenue.water += statement.charges.water;
                summary.revenue.total += statement.amount_due;
            } else {
                summary.unpaid += 1;
                summary.outstanding += statement.amount_due;
            }
        }

        Ok(summary)
    }

    /// Snapshot rows for the billing export
    #[instrument(skip_all, err)]
    pub async fn export_rows(&self, source: &dyn MeterReadingSource) -> Result<Vec<ExportRow>> {
        Ok(self.statements(source).await?.iter().map(ExportRow::from).collect())
    }

    /// Freeze a tenant's current charges into an invoice record
    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn issue_bill(&self, tenant_id: TenantId) -> Result<Bill> {
        let mut tx = self.store.begin().await?;
        let tenant = tx
            .tenant(tenant_id)
            .await?
            .ok_or_else(|| Error::not_found("Tenant", tenant_id))?;
        let room = match tenant.room_id {
            Some(room_id) => tx.room(room_id).await?,
            None => None,
        }
        .ok_or_else(|| Error::conflict("Tenant has no room to bill"))?;

        let charges = ChargeBreakdown::compute(&room, tenant.old_meter_reading, tenant.new_meter_reading, &self.rates());
        let bill = tx
            .create_bill(&BillCreateDBRequest {
                room_id: room.id,
                tenant_id: tenant.id,
                electricity: charges.electricity,
                water: charges.water,
                room_price: charges.room_price,
            })
            .await?;
        tx.commit().await?;

        info!(bill_id = %abbrev_uuid(&bill.id), total = %bill.total, "Bill issued");
        Ok(bill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::models::meter_readings::MeterReadingUpsertDBRequest,
        errors::ErrorKind,
        meters::StoredMeterFeed,
        occupancy::OccupancyManager,
        store::InMemoryStore,
        test_utils::{sample_new_room, sample_new_tenant, test_billing_config},
    };

    struct Fixture {
        feed: StoredMeterFeed,
        occupancy: OccupancyManager,
        billing: BillingCalculator,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let config = test_billing_config();
        Fixture {
            occupancy: OccupancyManager::new(store.clone(), config.rates()),
            billing: BillingCalculator::new(store.clone(), config),
            feed: StoredMeterFeed::new(store),
        }
    }

    /// A feed with no records at all
    struct EmptyFeed;

    #[async_trait::async_trait]
    impl MeterReadingSource for EmptyFeed {
        async fn readings(&self) -> Result<Vec<MeterReading>> {
            Ok(Vec::new())
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    /// Room 101 at 3,000,000 with one bathroom and one shower, occupied by citizen 001
    async fn occupied_room(f: &Fixture) -> (Room, Tenant) {
        let room = f.occupancy.create_room(sample_new_room("101")).await.unwrap();
        let view = f.occupancy.assign_tenant(sample_new_tenant(room.id, "001")).await.unwrap();
        (view.room.unwrap(), view.tenant)
    }

    #[test_log::test(tokio::test)]
    async fn test_move_in_then_meter_reading_totals_3250000() {
        let f = fixture();
        let (_, tenant) = occupied_room(&f).await;

        let statement = f.billing.record_meter_reading(tenant.id, 50).await.unwrap();

        assert_eq!(statement.charges.electricity, Decimal::from(150_000));
        assert_eq!(statement.charges.water, Decimal::from(100_000));
        assert_eq!(statement.charges.total, Decimal::from(3_250_000));
        assert_eq!(statement.billed_total, Decimal::from(3_250_000));
    }

    #[tokio::test]
    async fn test_negative_meter_reading_is_invalid() {
        let f = fixture();
        let (_, tenant) = occupied_room(&f).await;

        let err = f.billing.record_meter_reading(tenant.id, -1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_confirm_payment_is_idempotent() {
        let f = fixture();
        let (_, tenant) = occupied_room(&f).await;
        f.billing.record_meter_reading(tenant.id, 50).await.unwrap();

        let first = f.billing.confirm_payment("001").await.unwrap();
        let second = f.billing.confirm_payment("001").await.unwrap();

        assert!(first.is_paid);
        assert_eq!(first, second);
        assert_eq!(second.total_cost, Decimal::from(3_250_000));
    }

    #[tokio::test]
    async fn test_confirm_payment_unknown_citizen_is_not_found() {
        let f = fixture();
        let err = f.billing.confirm_payment("404").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test_log::test(tokio::test)]
    async fn test_reset_rolls_baseline_and_clears_payment() {
        let f = fixture();
        let (_, tenant) = occupied_room(&f).await;
        f.billing.record_meter_reading(tenant.id, 50).await.unwrap();
        f.billing.confirm_payment("001").await.unwrap();

        let outcome = f.billing.reset_billing_period("2024-06".parse().unwrap()).await.unwrap();
        assert_eq!(outcome.rolled, 1);

        let tenant = f.occupancy.tenant(tenant.id).await.unwrap().tenant;
        assert_eq!(tenant.old_meter_reading, 50);
        assert_eq!(tenant.new_meter_reading, 50);
        assert_eq!(tenant.total_cost, Decimal::ZERO);
        assert!(!tenant.is_paid);
        assert_eq!(tenant.billing_period.as_deref(), Some("2024-06"));
    }

    #[tokio::test]
    async fn test_reset_twice_matches_reset_once() {
        let f = fixture();
        let (_, tenant) = occupied_room(&f).await;
        f.billing.record_meter_reading(tenant.id, 50).await.unwrap();
        let period: BillingPeriod = "2024-06".parse().unwrap();

        f.billing.reset_billing_period(period).await.unwrap();
        let once = f.occupancy.tenant(tenant.id).await.unwrap().tenant;

        // a reading arriving between the two calls must not be rolled by the retry
        f.billing.record_meter_reading(tenant.id, 80).await.unwrap();
        let outcome = f.billing.reset_billing_period(period).await.unwrap();
        let twice = f.occupancy.tenant(tenant.id).await.unwrap().tenant;

        assert_eq!(outcome.rolled, 0);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(twice.old_meter_reading, once.old_meter_reading);
        assert!(!twice.is_paid);
    }

    #[tokio::test]
    async fn test_reset_skips_vacant_rooms_and_detached_tenants() {
        let f = fixture();
        f.occupancy.create_room(sample_new_room("102")).await.unwrap();

        let outcome = f.billing.reset_billing_period("2024-06".parse().unwrap()).await.unwrap();
        assert_eq!(outcome.rolled, 0);
        assert_eq!(outcome.skipped, 0);
    }

    #[tokio::test]
    async fn test_unpaid_is_gated_by_alert_day() {
        let f = fixture();
        occupied_room(&f).await;

        assert!(f.billing.unpaid(date(26), &f.feed).await.unwrap().is_empty());

        let unpaid = f.billing.unpaid(date(27), &f.feed).await.unwrap();
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].citizen_id, "001");

        f.billing.confirm_payment("001").await.unwrap();
        assert!(f.billing.unpaid(date(28), &f.feed).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_meter_readings_uses_feed() {
        let f = fixture();
        let (_, tenant) = occupied_room(&f).await;
        let second = f.occupancy.create_room(sample_new_room("102")).await.unwrap();
        f.occupancy.assign_tenant(sample_new_tenant(second.id, "002")).await.unwrap();

        f.feed
            .record(&MeterReadingUpsertDBRequest {
                room_number: "101".to_string(),
                old_reading: 100,
                new_reading: 150,
            })
            .await
            .unwrap();

        let statements = f.billing.apply_meter_readings(&f.feed).await.unwrap();

        assert_eq!(statements.len(), 2);
        let with_feed = statements.iter().find(|s| s.room_number == "101").unwrap();
        assert_eq!(with_feed.tenant_id, tenant.id);
        assert_eq!(with_feed.charges.electricity, Decimal::from(150_000));
        assert_eq!(with_feed.billed_total, Decimal::from(3_250_000));

        // no feed record for 102: no consumption billed
        let without_feed = statements.iter().find(|s| s.room_number == "102").unwrap();
        assert_eq!(without_feed.charges.electricity, Decimal::ZERO);
        assert_eq!(without_feed.billed_total, Decimal::from(3_100_000));
    }

    #[tokio::test]
    async fn test_summary_splits_revenue_by_component() {
        let f = fixture();
        let (_, tenant) = occupied_room(&f).await;
        f.billing.record_meter_reading(tenant.id, 50).await.unwrap();
        f.billing.confirm_payment("001").await.unwrap();
        let second = f.occupancy.create_room(sample_new_room("102")).await.unwrap();
        f.occupancy.assign_tenant(sample_new_tenant(second.id, "002")).await.unwrap();
        f.occupancy.create_room(sample_new_room("103")).await.unwrap();

        let summary = f.billing.summary(&f.feed).await.unwrap();

        assert_eq!(summary.total_rooms, 3);
        assert_eq!(summary.occupied_rooms, 2);
        assert_eq!(summary.vacant_rooms, 1);
        assert_eq!(summary.paid, 1);
        assert_eq!(summary.unpaid, 1);
        assert_eq!(summary.revenue.room, Decimal::from(3_000_000));
        assert_eq!(summary.revenue.electricity, Decimal::from(150_000));
        assert_eq!(summary.revenue.water, Decimal::from(100_000));
        assert_eq!(summary.revenue.total, Decimal::from(3_250_000));
        assert_eq!(summary.outstanding, Decimal::from(3_100_000));
    }

    #[tokio::test]
    async fn test_issue_bill_snapshots_current_charges() {
        let f = fixture();
        let (room, tenant) = occupied_room(&f).await;
        f.billing.record_meter_reading(tenant.id, 50).await.unwrap();

        let bill = f.billing.issue_bill(tenant.id).await.unwrap();

        assert_eq!(bill.room_id, room.id);
        assert_eq!(bill.total, Decimal::from(3_250_000));
        assert_eq!(bill.total, bill.electricity + bill.water + bill.room_price);
    }

    #[tokio::test]
    async fn test_export_rows_follow_statements() {
        let f = fixture();
        let (_, tenant) = occupied_room(&f).await;
        f.billing.record_meter_reading(tenant.id, 50).await.unwrap();

        let rows = f.billing.export_rows(&f.feed).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].room_number, "101");
        assert_eq!(rows[0].meter_new, 50);
        assert_eq!(rows[0].total_cost, Decimal::from(3_250_000));
        assert!(!rows[0].paid);
    }

    #[tokio::test]
    async fn test_billing_run_without_feed_record_keeps_recorded_reading() {
        let f = fixture();
        let (_, tenant) = occupied_room(&f).await;
        f.billing.record_meter_reading(tenant.id, 50).await.unwrap();

        let statements = f.billing.apply_meter_readings(&EmptyFeed).await.unwrap();

        let tenant = f.occupancy.tenant(tenant.id).await.unwrap().tenant;
        assert_eq!(tenant.old_meter_reading, 0);
        assert_eq!(tenant.new_meter_reading, 50);
        assert_eq!(tenant.total_cost, Decimal::from(3_100_000));
        assert_eq!(statements[0].new_meter_reading, 50);
        assert_eq!(statements[0].charges.electricity, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_recorded_reading_is_mirrored_into_feed() {
        let f = fixture();
        let (_, tenant) = occupied_room(&f).await;

        f.billing.record_meter_reading(tenant.id, 50).await.unwrap();

        let readings = f.feed.readings().await.unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].room_number, "101");
        assert_eq!((readings[0].old_reading, readings[0].new_reading), (0, 50));
    }

    #[tokio::test]
    async fn test_statements_read_the_feed() {
        let f = fixture();
        let (_, tenant) = occupied_room(&f).await;
        f.billing.record_meter_reading(tenant.id, 50).await.unwrap();
        let second = f.occupancy.create_room(sample_new_room("102")).await.unwrap();
        f.occupancy.assign_tenant(sample_new_tenant(second.id, "002")).await.unwrap();

        let statements = f.billing.statements(&f.feed).await.unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].charges.electricity, Decimal::from(150_000));
        assert_eq!(statements[0].amount_due, Decimal::from(3_250_000));
        // 102 has neither a feed record nor a stored total
        assert_eq!(statements[1].charges.electricity, Decimal::ZERO);
        assert_eq!(statements[1].billed_total, Decimal::ZERO);
        assert_eq!(statements[1].amount_due, Decimal::from(3_100_000));

        // without the feed, 101 shows no consumption but still owes its stored total
        let statements = f.billing.statements(&EmptyFeed).await.unwrap();
        assert_eq!(statements[0].charges.electricity, Decimal::ZERO);
        assert_eq!(statements[0].amount_due, Decimal::from(3_250_000));
    }

    #[tokio::test]
    async fn test_reset_rolls_feed_baseline() {
        let f = fixture();
        let (_, tenant) = occupied_room(&f).await;
        f.billing.record_meter_reading(tenant.id, 50).await.unwrap();

        f.billing.reset_billing_period("2024-06".parse().unwrap()).await.unwrap();

        let readings = f.feed.readings().await.unwrap();
        assert_eq!((readings[0].old_reading, readings[0].new_reading), (50, 50));

        let statements = f.billing.statements(&f.feed).await.unwrap();
        assert_eq!(statements[0].charges.electricity, Decimal::ZERO);
        assert_eq!(statements[0].amount_due, Decimal::from(3_100_000));
    }

    #[tokio::test]
    async fn test_oversized_meter_reading_is_invalid() {
        let f = fixture();
        let (_, tenant) = occupied_room(&f).await;

        let err = f.billing.record_meter_reading(tenant.id, i64::MAX).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
