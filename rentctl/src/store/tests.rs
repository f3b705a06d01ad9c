//! Behaviour every store backend must share. Each check runs against the in-memory store, and
//! against PostgreSQL with the `postgres-tests` feature.

use rstest::{fixture, rstest};
use rust_decimal::Decimal;

use crate::db::errors::DbError;
use crate::db::models::{
    bills::{BillCreateDBRequest, BillFilter, BillUpdateDBRequest},
    meter_readings::MeterReadingUpsertDBRequest,
    rooms::{RoomCreateDBRequest, RoomUpdateDBRequest},
    tenants::{TenantCreateDBRequest, TenantUpdateDBRequest},
};
use crate::store::{Store, in_memory::InMemoryStore};
use crate::types::RoomId;

#[cfg(feature = "postgres-tests")]
use crate::store::postgres::PostgresStore;

fn room_request(room_number: &str) -> RoomCreateDBRequest {
    RoomCreateDBRequest {
        room_number: room_number.to_string(),
        floor: 1,
        price: Decimal::from(3_000_000),
        bathroom_count: 1,
        shower_count: 1,
    }
}

fn tenant_request(room_id: RoomId, citizen_id: &str) -> TenantCreateDBRequest {
    TenantCreateDBRequest {
        citizen_id: citizen_id.to_string(),
        name: "Lan".to_string(),
        phone: "0900".to_string(),
        email: None,
        move_in_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        room_id,
    }
}

#[fixture]
fn in_memory_store() -> InMemoryStore {
    InMemoryStore::new()
}

async fn run_test_rooms_unique_and_ordered<S: Store>(store: &S) {
    let mut tx = store.begin().await.unwrap();
    tx.create_room(&room_request("201")).await.unwrap();
    let first = tx.create_room(&room_request("101")).await.unwrap();
    tx.create_room(&room_request("102")).await.unwrap();
    tx.commit().await.unwrap();

    assert!(first.is_vacant());

    let mut tx = store.begin().await.unwrap();
    let numbers: Vec<String> = tx.rooms().await.unwrap().into_iter().map(|r| r.room_number).collect();
    assert_eq!(numbers, vec!["101", "102", "201"]);

    let found = tx.room_by_number("101").await.unwrap().unwrap();
    assert_eq!(found.id, first.id);
    assert!(tx.room_by_number("999").await.unwrap().is_none());

    let err = tx.create_room(&room_request("101")).await.unwrap_err();
    assert!(matches!(err, DbError::UniqueViolation { .. }), "got {err:?}");
}

#[rstest]
#[tokio::test]
async fn test_rooms_unique_and_ordered(in_memory_store: InMemoryStore) {
    run_test_rooms_unique_and_ordered(&in_memory_store).await;
}

#[cfg(feature = "postgres-tests")]
#[sqlx::test]
async fn test_rooms_unique_and_ordered_postgres(pool: sqlx::PgPool) {
    run_test_rooms_unique_and_ordered(&PostgresStore::new(pool)).await;
}

async fn run_test_update_room<S: Store>(store: &S) {
    let mut tx = store.begin().await.unwrap();
    let room = tx.create_room(&room_request("101")).await.unwrap();
    tx.create_room(&room_request("102")).await.unwrap();

    let updated = tx
        .update_room(
            room.id,
            &RoomUpdateDBRequest {
                price: Some(Decimal::from(3_500_000)),
                shower_count: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.price, Decimal::from(3_500_000));
    assert_eq!(updated.shower_count, 2);
    assert_eq!(updated.bathroom_count, 1);
    assert_eq!(updated.room_number, "101");

    let err = tx
        .update_room(
            room.id,
            &RoomUpdateDBRequest {
                room_number: Some("102".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UniqueViolation { .. }), "got {err:?}");
}

#[rstest]
#[tokio::test]
async fn test_update_room(in_memory_store: InMemoryStore) {
    run_test_update_room(&in_memory_store).await;
}

#[cfg(feature = "postgres-tests")]
#[sqlx::test]
async fn test_update_room_postgres(pool: sqlx::PgPool) {
    run_test_update_room(&PostgresStore::new(pool)).await;
}

async fn run_test_occupancy_references<S: Store>(store: &S) {
    let mut tx = store.begin().await.unwrap();
    let a = tx.create_room(&room_request("101")).await.unwrap();
    let b = tx.create_room(&room_request("102")).await.unwrap();
    let tenant = tx.create_tenant(&tenant_request(a.id, "001")).await.unwrap();
    let a = tx.set_room_tenant(a.id, Some(tenant.id)).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(a.tenant_id, Some(tenant.id));
    assert_eq!(tenant.room_id, Some(a.id));
    assert!(!tenant.is_paid);
    assert_eq!(tenant.total_cost, Decimal::ZERO);

    // one tenant cannot be referenced by two rooms
    let mut tx = store.begin().await.unwrap();
    let err = tx.set_room_tenant(b.id, Some(tenant.id)).await.unwrap_err();
    assert!(matches!(err, DbError::UniqueViolation { .. }), "got {err:?}");
    drop(tx);

    // a tenant must reference an existing room
    let mut tx = store.begin().await.unwrap();
    let err = tx
        .create_tenant(&tenant_request(uuid::Uuid::new_v4(), "002"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::ForeignKeyViolation { .. }), "got {err:?}");
    drop(tx);

    let mut tx = store.begin().await.unwrap();
    let err = tx.create_tenant(&tenant_request(b.id, "001")).await.unwrap_err();
    assert!(matches!(err, DbError::UniqueViolation { .. }), "got {err:?}");
    drop(tx);

    // deleting the tenant clears the room's reference
    let mut tx = store.begin().await.unwrap();
    assert!(tx.delete_tenant(tenant.id).await.unwrap());
    assert!(!tx.delete_tenant(tenant.id).await.unwrap());
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let a = tx.room(a.id).await.unwrap().unwrap();
    assert!(a.is_vacant());
    assert!(tx.tenants_by_citizen_id("001").await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_occupancy_references(in_memory_store: InMemoryStore) {
    run_test_occupancy_references(&in_memory_store).await;
}

#[cfg(feature = "postgres-tests")]
#[sqlx::test]
async fn test_occupancy_references_postgres(pool: sqlx::PgPool) {
    run_test_occupancy_references(&PostgresStore::new(pool)).await;
}

async fn run_test_uncommitted_transaction_is_discarded<S: Store>(store: &S) {
    let mut tx = store.begin().await.unwrap();
    let room = tx.create_room(&room_request("101")).await.unwrap();
    let tenant = tx.create_tenant(&tenant_request(room.id, "001")).await.unwrap();
    tx.set_room_tenant(room.id, Some(tenant.id)).await.unwrap();
    drop(tx);

    let mut tx = store.begin().await.unwrap();
    assert!(tx.rooms().await.unwrap().is_empty());
    assert!(tx.tenants().await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_uncommitted_transaction_is_discarded(in_memory_store: InMemoryStore) {
    run_test_uncommitted_transaction_is_discarded(&in_memory_store).await;
}

#[cfg(feature = "postgres-tests")]
#[sqlx::test]
async fn test_uncommitted_transaction_is_discarded_postgres(pool: sqlx::PgPool) {
    run_test_uncommitted_transaction_is_discarded(&PostgresStore::new(pool)).await;
}

async fn run_test_tenant_billing_fields<S: Store>(store: &S) {
    let mut tx = store.begin().await.unwrap();
    let room = tx.create_room(&room_request("101")).await.unwrap();
    let tenant = tx.create_tenant(&tenant_request(room.id, "001")).await.unwrap();

    let updated = tx
        .update_tenant(
            tenant.id,
            &TenantUpdateDBRequest {
                new_meter_reading: Some(50),
                total_cost: Some(Decimal::from(3_250_000)),
                billing_period: Some("2024-03".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(updated.old_meter_reading, 0);
    assert_eq!(updated.new_meter_reading, 50);
    assert_eq!(updated.total_cost, Decimal::from(3_250_000));
    assert_eq!(updated.billing_period.as_deref(), Some("2024-03"));
    assert_eq!(updated.name, "Lan");

    let mut tx = store.begin().await.unwrap();
    let err = tx
        .update_tenant(uuid::Uuid::new_v4(), &TenantUpdateDBRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound), "got {err:?}");
}

#[rstest]
#[tokio::test]
async fn test_tenant_billing_fields(in_memory_store: InMemoryStore) {
    run_test_tenant_billing_fields(&in_memory_store).await;
}

#[cfg(feature = "postgres-tests")]
#[sqlx::test]
async fn test_tenant_billing_fields_postgres(pool: sqlx::PgPool) {
    run_test_tenant_billing_fields(&PostgresStore::new(pool)).await;
}

async fn run_test_bills_follow_their_tenant<S: Store>(store: &S) {
    let mut tx = store.begin().await.unwrap();
    let room = tx.create_room(&room_request("101")).await.unwrap();
    let tenant = tx.create_tenant(&tenant_request(room.id, "001")).await.unwrap();
    let bill = tx
        .create_bill(&BillCreateDBRequest {
            room_id: room.id,
            tenant_id: tenant.id,
            electricity: Decimal::from(150_000),
            water: Decimal::from(100_000),
            room_price: Decimal::from(3_000_000),
        })
        .await
        .unwrap();
    assert_eq!(bill.total, Decimal::from(3_250_000));

    let bill = tx
        .update_bill(
            bill.id,
            &BillUpdateDBRequest {
                water: Some(Decimal::ZERO),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(bill.total, Decimal::from(3_150_000));

    let by_room = tx
        .bills(&BillFilter {
            room_id: Some(room.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_room, vec![bill.clone()]);
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    tx.delete_tenant(tenant.id).await.unwrap();
    assert!(tx.bill(bill.id).await.unwrap().is_none());
    assert!(tx.bills(&BillFilter::default()).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_bills_follow_their_tenant(in_memory_store: InMemoryStore) {
    run_test_bills_follow_their_tenant(&in_memory_store).await;
}

#[cfg(feature = "postgres-tests")]
#[sqlx::test]
async fn test_bills_follow_their_tenant_postgres(pool: sqlx::PgPool) {
    run_test_bills_follow_their_tenant(&PostgresStore::new(pool)).await;
}

async fn run_test_meter_feed_upsert<S: Store>(store: &S) {
    let mut tx = store.begin().await.unwrap();
    for (room_number, new_reading) in [("102", 20), ("101", 40), ("101", 55)] {
        tx.upsert_meter_reading(&MeterReadingUpsertDBRequest {
            room_number: room_number.to_string(),
            old_reading: 0,
            new_reading,
        })
        .await
        .unwrap();
    }
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let feed: Vec<(String, i64)> = tx
        .meter_readings()
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.room_number, r.new_reading))
        .collect();
    assert_eq!(feed, vec![("101".to_string(), 55), ("102".to_string(), 20)]);
}

#[rstest]
#[tokio::test]
async fn test_meter_feed_upsert(in_memory_store: InMemoryStore) {
    run_test_meter_feed_upsert(&in_memory_store).await;
}

#[cfg(feature = "postgres-tests")]
#[sqlx::test]
async fn test_meter_feed_upsert_postgres(pool: sqlx::PgPool) {
    run_test_meter_feed_upsert(&PostgresStore::new(pool)).await;
}
